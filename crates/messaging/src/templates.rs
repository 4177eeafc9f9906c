//! Customer-facing message templates.

use chrono::{DateTime, FixedOffset, Utc};
use gardens_core::Voucher;

/// Western Indonesia Time, used for every customer-facing timestamp.
const WIB_OFFSET_SECS: i32 = 7 * 3600;

/// Formats a timestamp as `17/10/2026 21:05 WIB`.
pub fn format_local(ts: DateTime<Utc>) -> String {
    match FixedOffset::east_opt(WIB_OFFSET_SECS) {
        Some(wib) => ts.with_timezone(&wib).format("%d/%m/%Y %H:%M WIB").to_string(),
        None => ts.format("%d/%m/%Y %H:%M UTC").to_string(),
    }
}

/// Voucher delivery message.
pub fn voucher_message(voucher: &Voucher) -> String {
    let name = voucher.customer.name.trim();
    let greeting = if name.is_empty() {
        "Halo!".to_string()
    } else {
        format!("Halo {}!", name)
    };

    format!(
        "*GARDENS-NET WiFi Voucher*\n\
         \n\
         {greeting}\n\
         Terima kasih telah membeli voucher WiFi.\n\
         \n\
         Kode voucher: *{code}*\n\
         Paket: {package}\n\
         Berlaku sampai: {expires}\n\
         \n\
         Cara menggunakan:\n\
         1. Sambungkan perangkat ke WiFi GARDENS-NET\n\
         2. Buka halaman login hotspot\n\
         3. Masukkan kode voucher sebagai username dan password\n\
         \n\
         Order ID: {order_id}",
        greeting = greeting,
        code = voucher.code,
        package = voucher.package.display_name(),
        expires = format_local(voucher.expires_at),
        order_id = voucher.order_id,
    )
}

/// Message sent by the admin connection test.
pub fn connection_test_message() -> String {
    format!(
        "GARDENS-NET: tes koneksi WhatsApp berhasil ({})",
        format_local(Utc::now())
    )
}

//! Terminal rendering of QR codes.
//!
//! Two module rows share one text line through the half-block characters, and
//! colors are inverted: light modules are drawn as blocks, dark modules as
//! blanks. On a dark terminal the code then reads as dark-on-light.

use crate::utils::error::Result;
use qrcode::{Color, EcLevel, QrCode};

pub const DEFAULT_BORDER: u32 = 2;

// 索引 = 上方模組 + 下方模組 << 1，1 代表深色
const INVERTED_BLOCKS: [char; 4] = ['\u{2588}', '\u{2584}', '\u{2580}', '\u{00a0}'];

/// 以最小可容納的版本 (EC level M) 編碼 `data`
pub fn render_qr(data: &str, border: u32) -> Result<String> {
    let code = QrCode::with_error_correction_level(data.as_bytes(), EcLevel::M)?;
    let size = code.width() as i64;
    let colors = code.to_colors();
    let border = i64::from(border);

    let module = |row: i64, col: i64| -> usize {
        // 高度為奇數時，最後一行下半部超出邊框，留白
        if border > 0 && row.max(col) >= size + border {
            return 1;
        }
        if row.min(col) < 0 || row.max(col) >= size {
            return 0;
        }
        match colors[(row * size + col) as usize] {
            Color::Dark => 1,
            Color::Light => 0,
        }
    };

    let span = size + 2 * border;
    let mut out = String::with_capacity(((span + 1) * (span / 2 + 1)) as usize * 3);
    let mut row = -border;
    while row < size + border {
        for col in -border..size + border {
            out.push(INVERTED_BLOCKS[module(row, col) + (module(row + 1, col) << 1)]);
        }
        out.push('\n');
        row += 2;
    }

    tracing::debug!("Rendered {}x{} QR code for {} bytes", size, size, data.len());
    Ok(out)
}

pub fn print_qr(data: &str, border: u32) -> Result<()> {
    let art = render_qr(data, border)?;
    print!("{}", art);
    Ok(())
}

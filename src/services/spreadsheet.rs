//! Spreadsheet report of a listing.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use thiserror::Error;

use crate::models::Spj;
use crate::utils::format_date_id;

/// Suggested download name.
pub const SPREADSHEET_FILENAME: &str = "laporan-arsip-spj.xlsx";

pub const SHEET_NAME: &str = "Laporan SPJ";
pub const REPORT_TITLE: &str = "Laporan Arsip SPJ";

/// Agency letterhead printed above the report.
pub const LETTERHEAD: [&str; 5] = [
    "PEMERINTAH KABUPATEN LOMBOK BARAT",
    "BADAN PERENCANAAN PEMBANGUNAN DAERAH",
    "Jalan Soekarno-Hatta, Giri Menang-Gerung, Kode Pos 83363",
    "Telepon (0370) 6183012, Faksimili (0370) 6183012",
    "Laman: bappeda.lombokbaratkab.go.id, Pos-el: bappeda@lombokbaratkab.go.id",
];

pub const HEADERS: [&str; 8] = [
    "No",
    "No. Pembukuan",
    "Kode Rekening",
    "Jenis SPJ",
    "Bidang",
    "Tanggal",
    "Uraian",
    "Terbilang (Rp)",
];

const COLUMN_WIDTHS: [f64; 8] = [5.0, 20.0, 20.0, 10.0, 15.0, 15.0, 40.0, 20.0];

// Zero-based rows
const TITLE_ROW: u32 = 6;
const HEADER_ROW: u32 = 8;
const FIRST_DATA_ROW: u32 = 9;

const AMOUNT_FORMAT: &str = "\"Rp\"#,##0";

#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] XlsxError),
}

/// Render records, in the given order, as an xlsx workbook.
pub fn render_spreadsheet(records: &[Spj]) -> Result<Vec<u8>, SpreadsheetError> {
    let mut workbook = Workbook::new();
    let amount = Format::new().set_num_format(AMOUNT_FORMAT);

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (row, line) in LETTERHEAD.iter().enumerate() {
            sheet.write_string(row as u32, 0, *line)?;
        }
        sheet.write_string(TITLE_ROW, 0, REPORT_TITLE)?;

        for (col, header) in HEADERS.iter().enumerate() {
            sheet.write_string(HEADER_ROW, col as u16, *header)?;
        }

        for (i, spj) in records.iter().enumerate() {
            let row = FIRST_DATA_ROW + i as u32;
            sheet.write_number(row, 0, (i + 1) as f64)?;
            sheet.write_string(row, 1, &spj.nomor_pembukuan)?;
            sheet.write_string(row, 2, &spj.kode_rekening)?;
            sheet.write_string(row, 3, spj.jenis_spj.as_str())?;
            sheet.write_string(row, 4, spj.bidang.map_or("-", |b| b.as_str()))?;
            sheet.write_string(row, 5, format_date_id(spj.tanggal))?;
            sheet.write_string(row, 6, &spj.uraian)?;
            sheet.write_number_with_format(row, 7, spj.jumlah as f64, &amount)?;
        }

        for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
            sheet.set_column_width(col as u16, *width)?;
        }
    }

    tracing::debug!("Rendered spreadsheet with {} rows", records.len());
    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bidang, JenisSpj};
    use chrono::NaiveDate;
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn read_part(bytes: &[u8], part: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut xml = String::new();
        archive.by_name(part).unwrap().read_to_string(&mut xml).unwrap();
        xml
    }

    fn spj(nomor: &str, bidang: Option<Bidang>, jumlah: i64) -> Spj {
        Spj {
            id: nomor.to_string(),
            nomor_pembukuan: nomor.to_string(),
            kode_rekening: "5.1.02.01.01.0024".to_string(),
            jenis_spj: JenisSpj::Gu,
            bidang,
            tanggal: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            uraian: "Belanja alat tulis kantor".to_string(),
            jumlah,
            file_url: None,
        }
    }

    #[test]
    fn test_rows_and_numeric_amounts() {
        let records = vec![
            spj("001/GU", Some(Bidang::Ekonomi), 1_250_000),
            spj("002/GU", None, 75_500),
        ];
        let bytes = render_spreadsheet(&records).unwrap();

        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<row r=\"10\""));
        assert!(sheet.contains("<row r=\"11\""));
        assert!(!sheet.contains("<row r=\"12\""));
        assert!(sheet.contains("<v>1250000</v>"));
        assert!(sheet.contains("<v>75500</v>"));

        let strings = read_part(&bytes, "xl/sharedStrings.xml");
        assert!(strings.contains("Laporan Arsip SPJ"));
        assert!(strings.contains("PEMERINTAH KABUPATEN LOMBOK BARAT"));
        assert!(strings.contains("Terbilang (Rp)"));
        assert!(strings.contains("7/3/2024"));
        assert!(strings.contains("<t>-</t>"));

        let workbook = read_part(&bytes, "xl/workbook.xml");
        assert!(workbook.contains("name=\"Laporan SPJ\""));
    }

    #[test]
    fn test_empty_listing_still_has_header() {
        let bytes = render_spreadsheet(&[]).unwrap();
        let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains("<row r=\"9\""));
        assert!(!sheet.contains("<row r=\"10\""));
    }
}

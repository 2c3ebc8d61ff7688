//! Gzip-compressed, newline-delimited JSON decoding

use flate2::read::GzDecoder;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io::Read;
use tracing::debug;

use super::error::{DatasetError, DatasetResult};

/// Records decoded from one payload, in file order
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub records: Vec<T>,
    /// Lines that were valid JSON but did not fit the record type
    pub skipped: usize,
}

/// Gunzip `bytes` and decode each non-blank line into a `T`.
///
/// A line that is not JSON fails the whole payload. A JSON line with missing or mistyped
/// fields is skipped and counted.
pub fn decode_ndjson_gz<T: DeserializeOwned>(bytes: &[u8]) -> DatasetResult<Decoded<T>> {
    let mut raw = Vec::with_capacity(bytes.len() * 4);
    GzDecoder::new(bytes)
        .read_to_end(&mut raw)
        .map_err(DatasetError::Decompress)?;

    let text = String::from_utf8(raw)?;
    decode_ndjson(&text)
}

/// Decode already-decompressed NDJSON text
pub fn decode_ndjson<T: DeserializeOwned>(text: &str) -> DatasetResult<Decoded<T>> {
    let mut records = Vec::new();
    let mut skipped = 0;

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line).map_err(|source| DatasetError::Parse {
            line: index + 1,
            source,
        })?;

        match serde_json::from_value::<T>(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!(line = index + 1, error = %e, "skipping malformed record");
                skipped += 1;
            }
        }
    }

    Ok(Decoded { records, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CampaignRecord, MonthlyRecord};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn one_record_per_non_empty_line() {
        let payload = gzip(
            "{\"month\":\"2025-07\",\"sent\":1,\"delivered\":1,\"cost\":0.5}\n\
             {\"month\":\"2025-08\",\"sent\":2,\"delivered\":2}\n",
        );

        let decoded: Decoded<MonthlyRecord> = decode_ndjson_gz(&payload).unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.records[0].month, "2025-07");
        assert_eq!(decoded.records[1].cost, 0.0);
        assert_eq!(decoded.skipped, 0);
    }

    #[test]
    fn blank_and_whitespace_lines_are_ignored() {
        let payload = gzip("\n{\"month\":\"2025-07\",\"sent\":1,\"delivered\":1}\n   \n\r\n");

        let decoded: Decoded<MonthlyRecord> = decode_ndjson_gz(&payload).unwrap();
        assert_eq!(decoded.records.len(), 1);
    }

    #[test]
    fn crlf_line_endings() {
        let decoded: Decoded<MonthlyRecord> = decode_ndjson(
            "{\"month\":\"2025-07\",\"sent\":1,\"delivered\":1}\r\n{\"month\":\"2025-08\",\"sent\":1,\"delivered\":1}\r\n",
        )
        .unwrap();
        assert_eq!(decoded.records.len(), 2);
    }

    #[test]
    fn invalid_json_fails_the_payload() {
        let payload = gzip("{\"month\":\"2025-07\",\"sent\":1,\"delivered\":1}\n{not json}\n");

        let err = decode_ndjson_gz::<MonthlyRecord>(&payload).unwrap_err();
        assert!(matches!(err, DatasetError::Parse { line: 2, .. }));
    }

    #[test]
    fn mistyped_records_are_skipped() {
        let text = "{\"date\":\"2025-07-01\",\"product\":\"P1\",\"project\":\"X\",\"campaignName\":\"C1\",\"sent\":1,\"delivered\":1}\n\
                    {\"date\":\"2025-07-01\",\"product\":\"P1\",\"campaignName\":\"C1\",\"sent\":1,\"delivered\":1}\n\
                    {\"date\":\"2025-07-01\",\"product\":\"P1\",\"project\":\"X\",\"sent\":\"many\",\"delivered\":1}\n";

        let decoded: Decoded<CampaignRecord> = decode_ndjson(text).unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.skipped, 2);
    }

    #[test]
    fn non_gzip_payload_is_a_decompression_error() {
        let err = decode_ndjson_gz::<MonthlyRecord>(b"plain text").unwrap_err();
        assert!(matches!(err, DatasetError::Decompress(_)));
    }

    #[test]
    fn empty_payload_decodes_to_nothing() {
        let decoded: Decoded<MonthlyRecord> = decode_ndjson_gz(&gzip("")).unwrap();
        assert!(decoded.records.is_empty());
    }
}

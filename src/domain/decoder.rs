use crate::domain::model::DecodedId;
use crate::utils::error::{Result, SeatChartError};

/// 考號固定為 9 位數
pub const IDENTIFIER_DIGITS: usize = 9;

/// 9 位考號拆解：倒數 3-4 位為班級號，最後兩位為座位號。
///
/// Identifiers that render with fewer or more than 9 digits are rejected,
/// never zero-padded.
pub fn decode(identifier: i64) -> Result<DecodedId> {
    if identifier < 0 || identifier.to_string().len() != IDENTIFIER_DIGITS {
        return Err(SeatChartError::InvalidIdentifierFormat { identifier });
    }

    Ok(DecodedId {
        class_number: ((identifier / 100) % 100) as u8,
        seat_number: (identifier % 100) as u8,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_nine_digits() {
        let id = decode(123456789).unwrap();
        assert_eq!(id.class_number, 67);
        assert_eq!(id.seat_number, 89);
    }

    #[test]
    fn test_decode_low_seat_and_class() {
        let id = decode(250010305).unwrap();
        assert_eq!(id.class_number, 3);
        assert_eq!(id.seat_number, 5);

        let id = decode(100000000).unwrap();
        assert_eq!(id.class_number, 0);
        assert_eq!(id.seat_number, 0);
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        for bad in [12345, 1234567890, 12345678, 0] {
            match decode(bad) {
                Err(SeatChartError::InvalidIdentifierFormat { identifier }) => {
                    assert_eq!(identifier, bad)
                }
                other => panic!("expected InvalidIdentifierFormat for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_decode_rejects_negative() {
        // "-12345678" 也是 9 個字元
        assert!(decode(-12345678).is_err());
        assert!(decode(-123456789).is_err());
    }
}

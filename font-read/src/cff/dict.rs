//! Parsing for CFF DICTs.
//!
//! A DICT is a sequence of operands followed by an operator. Only integer
//! operands are decoded here; real numbers are skipped.

use crate::ByteCursor;

/// Top DICT: offset of the CharStrings INDEX.
pub const CHARSTRINGS: u16 = 17;
/// Top/Font DICT: size and offset of the Private DICT.
pub const PRIVATE: u16 = 18;
/// Private DICT: offset of the local Subrs INDEX, relative to the Private DICT.
pub const SUBRS: u16 = 19;
/// Top DICT: charstring type. Defaults to 2.
pub const CHARSTRING_TYPE: u16 = 0x100 | 6;
/// Top DICT: offset of the FDArray INDEX in CID-keyed fonts.
pub const FD_ARRAY: u16 = 0x100 | 36;
/// Top DICT: offset of the FDSelect table in CID-keyed fonts.
pub const FD_SELECT: u16 = 0x100 | 37;

const ESCAPE: u8 = 12;

/// Decodes an integer operand at the cursor.
///
/// Size   b0 range     Value range              Value calculation
/// --------------------------------------------------------------------------
/// 1      32 to 246    -107 to +107             b0 - 139
/// 2      247 to 250   +108 to +1131            (b0 - 247) * 256 + b1 + 108
/// 2      251 to 254   -1131 to -108            -(b0 - 251) * 256 - b1 - 108
/// 3      28           -32768 to +32767         b1 << 8 | b2
/// 5      29           -(2^31) to +(2^31 - 1)   b1 << 24 | b2 << 16 | b3 << 8 | b4
///
/// Any other leading byte decodes to 0.
pub fn read_int(cursor: &mut ByteCursor) -> i32 {
    let b0 = cursor.get8() as i32;
    match b0 {
        32..=246 => b0 - 139,
        247..=250 => (b0 - 247) * 256 + cursor.get8() as i32 + 108,
        251..=254 => -(b0 - 251) * 256 - cursor.get8() as i32 - 108,
        28 => cursor.get16() as i16 as i32,
        29 => cursor.get32() as i32,
        _ => 0,
    }
}

/// Skips an integer or real operand at the cursor.
pub fn skip_operand(cursor: &mut ByteCursor) {
    if cursor.peek8() == 30 {
        cursor.skip(1);
        // packed BCD nibbles terminated by 0xF
        while !cursor.at_end() {
            let v = cursor.get8();
            if v & 0xF == 0xF || v >> 4 == 0xF {
                break;
            }
        }
    } else {
        read_int(cursor);
    }
}

/// A DICT: a view over its raw bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dict<'a> {
    data: ByteCursor<'a>,
}

impl<'a> Dict<'a> {
    pub fn new(data: ByteCursor<'a>) -> Self {
        Self { data }
    }

    /// Returns the operand bytes for `key`, or an empty cursor if the key is
    /// absent.
    ///
    /// Two byte operators are encoded as `0x100 | second_byte`.
    pub fn get(&self, key: u16) -> ByteCursor<'a> {
        let mut b = self.data;
        b.seek(0);
        while !b.at_end() {
            let start = b.position();
            while b.peek8() >= 28 {
                skip_operand(&mut b);
            }
            let end = b.position();
            let mut op = b.get8() as u16;
            if op == ESCAPE as u16 {
                op = 0x100 | b.get8() as u16;
            }
            if op == key {
                return b.range(start, end - start);
            }
        }
        ByteCursor::empty()
    }

    /// Decodes up to `out.len()` integer operands for `key` into `out`.
    ///
    /// Entries without a corresponding operand keep their existing value, so
    /// callers can pre-fill defaults.
    pub fn get_ints(&self, key: u16, out: &mut [i32]) {
        let mut operands = self.get(key);
        for value in out.iter_mut() {
            if operands.at_end() {
                break;
            }
            *value = read_int(&mut operands);
        }
    }

    /// Returns the first integer operand for `key`, if present.
    pub fn get_int(&self, key: u16) -> Option<i32> {
        let mut operands = self.get(key);
        (!operands.at_end()).then(|| read_int(&mut operands))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use font_test_data::cff::{dict_int, dict_op};

    #[test]
    fn int_encodings() {
        let cases: &[(&[u8], i32)] = &[
            (&[139], 0),
            (&[32], -107),
            (&[246], 107),
            (&[247, 0], 108),
            (&[250, 255], 1131),
            (&[251, 0], -108),
            (&[254, 255], -1131),
            (&[28, 0x80, 0x00], -32768),
            (&[28, 0x7F, 0xFF], 32767),
            (&[29, 0x00, 0x01, 0x86, 0xA0], 100000),
            (&[29, 0xFF, 0xFF, 0xFF, 0xFF], -1),
        ];
        for (bytes, expected) in cases {
            let mut cursor = ByteCursor::new(bytes);
            assert_eq!(read_int(&mut cursor), *expected, "{bytes:?}");
            assert!(cursor.at_end());
        }
    }

    #[test]
    fn lookup_keys() {
        let mut data = Vec::new();
        // real number operand followed by an int: FontMatrix-ish junk
        data.extend([30, 0x1A, 0x2F]);
        data.extend(dict_int(5));
        data.extend(dict_op(0x100 | 7));
        data.extend(dict_int(1234));
        data.extend(dict_op(CHARSTRINGS));
        data.extend(dict_int(40));
        data.extend(dict_int(-300));
        data.extend(dict_op(PRIVATE));
        data.extend(dict_int(99_999));
        data.extend(dict_op(FD_SELECT));
        let dict = Dict::new(ByteCursor::new(&data));
        assert_eq!(dict.get_int(CHARSTRINGS), Some(1234));
        assert_eq!(dict.get_int(FD_SELECT), Some(99_999));
        assert_eq!(dict.get_int(FD_ARRAY), None);
        let mut private = [0; 2];
        dict.get_ints(PRIVATE, &mut private);
        assert_eq!(private, [40, -300]);
        // defaults survive when the key is absent
        let mut cs_type = [2];
        dict.get_ints(CHARSTRING_TYPE, &mut cs_type);
        assert_eq!(cs_type, [2]);
    }
}

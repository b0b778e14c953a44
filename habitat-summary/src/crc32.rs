//! CRC32C (Castagnoli) checksums.
//!
//! TFRecord framing protects both the record length and the record data
//! with a "masked" CRC32C. The lookup tables for the slicing-by-16
//! implementation are computed at compile time.

const CASTAGNOLI_POLY: u32 = 0x82f6_3b78;

const MASK_DELTA: u32 = 0xa282_ead8;

static TABLE16: [[u32; 256]; 16] = make_table16(CASTAGNOLI_POLY);

/// Returns the masked CRC32C checksum of `buf`.
///
/// Masking makes the checksum robust when the checksummed data itself
/// contains checksums.
pub fn crc32c_masked(buf: &[u8]) -> u32 {
    let crc = crc32c(buf);
    crc.rotate_right(15).wrapping_add(MASK_DELTA)
}

/// Returns the CRC32C checksum of `buf`.
pub fn crc32c(mut buf: &[u8]) -> u32 {
    let mut crc = !0u32;

    while buf.len() >= 16 {
        crc ^= u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        crc = TABLE16[0][buf[15] as usize]
            ^ TABLE16[1][buf[14] as usize]
            ^ TABLE16[2][buf[13] as usize]
            ^ TABLE16[3][buf[12] as usize]
            ^ TABLE16[4][buf[11] as usize]
            ^ TABLE16[5][buf[10] as usize]
            ^ TABLE16[6][buf[9] as usize]
            ^ TABLE16[7][buf[8] as usize]
            ^ TABLE16[8][buf[7] as usize]
            ^ TABLE16[9][buf[6] as usize]
            ^ TABLE16[10][buf[5] as usize]
            ^ TABLE16[11][buf[4] as usize]
            ^ TABLE16[12][(crc >> 24) as u8 as usize]
            ^ TABLE16[13][(crc >> 16) as u8 as usize]
            ^ TABLE16[14][(crc >> 8) as u8 as usize]
            ^ TABLE16[15][crc as u8 as usize];
        buf = &buf[16..];
    }

    for &b in buf {
        crc = TABLE16[0][((crc as u8) ^ b) as usize] ^ (crc >> 8);
    }

    !crc
}

const fn make_table(poly: u32) -> [u32; 256] {
    let mut table = [0; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 == 1 {
                (crc >> 1) ^ poly
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

const fn make_table16(poly: u32) -> [[u32; 256]; 16] {
    let mut tables = [[0; 256]; 16];
    tables[0] = make_table(poly);

    let mut i = 0;
    while i < 256 {
        let mut crc = tables[0][i];
        let mut j = 1;
        while j < 16 {
            crc = (crc >> 8) ^ tables[0][(crc & 0xff) as usize];
            tables[j][i] = crc;
            j += 1;
        }
        i += 1;
    }

    tables
}

#[cfg(test)]
mod tests {
    use super::{crc32c, crc32c_masked, CASTAGNOLI_POLY};

    fn crc32c_bitwise(buf: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &b in buf {
            crc ^= b as u32;
            for _ in 0..8 {
                crc = if crc & 1 == 1 {
                    (crc >> 1) ^ CASTAGNOLI_POLY
                } else {
                    crc >> 1
                };
            }
        }
        !crc
    }

    #[test]
    fn check_values() {
        assert_eq!(crc32c(b""), 0);
        assert_eq!(crc32c(b"123456789"), 0xe306_9283);
        assert_eq!(crc32c(&[0u8; 32]), 0x8a91_36aa);
        assert_eq!(crc32c(&[0xffu8; 32]), 0x62a8_ab43);
    }

    #[test]
    fn slicing_agrees_with_bitwise() {
        let data: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();
        for len in [0, 1, 15, 16, 17, 31, 32, 33, 999, 1000] {
            assert_eq!(crc32c(&data[..len]), crc32c_bitwise(&data[..len]));
        }
    }

    #[test]
    fn masking_rotates_and_offsets() {
        let crc = crc32c(b"brain.Event:2");
        assert_eq!(
            crc32c_masked(b"brain.Event:2"),
            ((crc >> 15) | (crc << 17)).wrapping_add(0xa282_ead8)
        );
    }
}

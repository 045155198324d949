//! CRC validation utilities for BPK1 containers.
//!
//! Every block in a BPK1 container carries a CRC-32 of its payload. The
//! parameters are not the common zlib ones: the register is seeded with the
//! polynomial itself, bits are processed MSB-first and there is no final xor.

/// CRC algorithm specification with polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// CRC-32 algorithm for BPK1 block payloads.
pub const CRC_BPK1_BLOCK_ALG: Algorithm<u32> = Algorithm {
    poly: 0x04c1_1db7,
    init: 0x04c1_1db7,
};

/// Computes a CRC-32 over `len` bits of the top byte of `value`.
#[inline(always)]
pub const fn crc32(poly: u32, mut value: u32, len: usize) -> u32 {
    let mut i = 0;
    while i < len {
        value = (value << 1) ^ (((value >> 31) & 1) * poly);
        i += 1;
    }

    value
}

#[inline(always)]
const fn crc32_table(poly: u32) -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc32(poly, (i as u32) << 24, 8);
        i += 1;
    }

    table
}

#[derive(Debug)]
pub struct Crc32 {
    pub poly: u32,
    pub init: u32,
    table: [u32; 256],
}

impl Crc32 {
    pub const fn new(algorithm: &Algorithm<u32>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc32_table(algorithm.poly),
        }
    }

    const fn table_entry(&self, index: u32) -> u32 {
        self.table[(index & 0xFF) as usize]
    }

    #[inline(always)]
    pub const fn update(&self, mut crc: u32, bytes: &[u8]) -> u32 {
        let mut i = 0;

        while i < bytes.len() {
            crc = self.table_entry((crc >> 24) ^ bytes[i] as u32) ^ (crc << 8);
            i += 1;
        }

        crc
    }

    /// Checksum of a whole buffer, starting from the algorithm's seed.
    #[inline(always)]
    pub const fn checksum(&self, bytes: &[u8]) -> u32 {
        self.update(self.init, bytes)
    }
}

/// Shared instance; the table is built at compile time.
pub static BPK1_CRC: Crc32 = Crc32::new(&CRC_BPK1_BLOCK_ALG);

#[test]
fn bpk1_crc_check_values() {
    assert_eq!(BPK1_CRC.checksum(b"123456789"), 0x0931_2918);
    assert_eq!(BPK1_CRC.checksum(&[]), 0x04c1_1db7);
    assert_eq!(BPK1_CRC.checksum(b"BPK1"), 0x26b3_365b);
}

#[test]
fn bpk1_crc_is_incremental() {
    let whole = BPK1_CRC.checksum(b"123456789");
    let partial = BPK1_CRC.update(BPK1_CRC.checksum(b"1234"), b"56789");
    assert_eq!(whole, partial);
}

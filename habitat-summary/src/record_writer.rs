use std::io::{self, Write};

use crate::crc32::crc32c_masked;

// TFRecord format:
//
// uint64 length
// uint32 masked_crc32_of_length
// byte   data[length]
// uint32 masked_crc32_of_data

/// Writer for length-delimited, checksummed records.
///
/// Each record is framed with its length and a masked CRC32C of both
/// the length and the payload, so that readers can detect truncated
/// event files. The writer does not buffer; wrap `W` in a `BufWriter`
/// when writing to a file.
pub struct RecordWriter<W> {
    write: W,
}

impl<W> From<W> for RecordWriter<W>
where
    W: Write,
{
    fn from(write: W) -> Self {
        RecordWriter { write }
    }
}

impl<W> RecordWriter<W>
where
    W: Write,
{
    pub fn flush(&mut self) -> io::Result<()> {
        self.write.flush()
    }

    /// Write a single record.
    pub fn write_record(&mut self, data: &[u8]) -> io::Result<()> {
        let len = (data.len() as u64).to_le_bytes();
        self.write.write_all(&len)?;
        self.write.write_all(&crc32c_masked(&len).to_le_bytes())?;
        self.write.write_all(data)?;
        self.write.write_all(&crc32c_masked(data).to_le_bytes())
    }
}

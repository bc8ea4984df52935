use log::trace;

use crate::error::{Result, VmError};

/// Armazenamento em blocos que simula o disco: um bloco por página, do
/// mesmo tamanho de uma página.
pub trait BlockStore {
    fn read_block(&mut self, block: usize, target: &mut [u8]) -> Result<()>;

    fn write_block(&mut self, block: usize, buffer: &[u8]) -> Result<()>;

    fn block_count(&self) -> usize;
}

/// Disco em memória, zerado na criação.
pub struct MemoryDisk {
    block_size: usize,
    data: Vec<u8>,
}

impl MemoryDisk {
    pub fn new(block_count: usize, block_size: usize) -> Self {
        MemoryDisk {
            block_size,
            data: vec![0; block_count * block_size],
        }
    }

    pub fn block(&self, block: usize) -> Option<&[u8]> {
        let start = block.checked_mul(self.block_size)?;

        self.data.get(start..start + self.block_size)
    }

    fn range(&self, block: usize, len: usize) -> Result<std::ops::Range<usize>> {
        if block >= self.block_count() {
            return Err(VmError::out_of_range("block", block, self.block_count()));
        }

        let start = block * self.block_size;

        Ok(start..start + len.min(self.block_size))
    }
}

impl BlockStore for MemoryDisk {
    fn read_block(&mut self, block: usize, target: &mut [u8]) -> Result<()> {
        let range = self.range(block, target.len())?;
        let len = range.len();

        target[..len].copy_from_slice(&self.data[range]);

        trace!("memory_disk: leu bloco {}", block);

        Ok(())
    }

    fn write_block(&mut self, block: usize, buffer: &[u8]) -> Result<()> {
        let range = self.range(block, buffer.len())?;
        let len = range.len();

        self.data[range].copy_from_slice(&buffer[..len]);

        trace!("memory_disk: escreveu bloco {}", block);

        Ok(())
    }

    fn block_count(&self) -> usize {
        if self.block_size == 0 {
            0
        } else {
            self.data.len() / self.block_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_block() {
        let mut disk = MemoryDisk::new(3, 4);

        disk.write_block(1, &[1, 2, 3, 4]).unwrap();

        let mut buf = [0u8; 4];
        disk.read_block(1, &mut buf).unwrap();

        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(disk.block(0).unwrap(), &[0, 0, 0, 0]);
        assert_eq!(disk.block_count(), 3);
    }

    #[test]
    fn rejects_block_past_end() {
        let mut disk = MemoryDisk::new(2, 4);
        let mut buf = [0u8; 4];

        assert!(matches!(
            disk.read_block(2, &mut buf),
            Err(VmError::OutOfRange { what: "block", index: 2, bound: 2 })
        ));
        assert!(disk.write_block(9, &buf).is_err());
    }
}

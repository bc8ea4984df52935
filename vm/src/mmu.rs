use std::ops::Range;

use log::{debug, trace};

use crate::{
    disk::BlockStore,
    error::{Result, VmError},
    fault::{FaultOutcome, FaultResolver},
    frame_table::FrameTable,
    page_replacer::PageReplacer,
    page_table::{Access, PageTable},
    stats::FaultStats,
};

/// Memória física: `frame_count` frames contíguos de `page_size` bytes.
pub struct PhysicalMemory {
    page_size: usize,
    bytes: Vec<u8>,
}

impl PhysicalMemory {
    /// `None` se `frame_count * page_size` estourar ou não couber na memória
    /// do host.
    pub fn new(frame_count: usize, page_size: usize) -> Option<Self> {
        let len = frame_count.checked_mul(page_size)?;

        Some(PhysicalMemory {
            page_size,
            bytes: crate::try_filled(len, 0)?,
        })
    }

    pub fn frame_count(&self) -> usize {
        if self.page_size == 0 {
            0
        } else {
            self.bytes.len() / self.page_size
        }
    }

    fn frame_idx_to_range(&self, frame_idx: usize) -> Result<Range<usize>> {
        if frame_idx >= self.frame_count() {
            return Err(VmError::out_of_range("frame", frame_idx, self.frame_count()));
        }

        Ok(Range {
            start: frame_idx * self.page_size,
            end: (frame_idx + 1) * self.page_size,
        })
    }

    pub fn frame(&self, frame_idx: usize) -> Result<&[u8]> {
        let range = self.frame_idx_to_range(frame_idx)?;

        Ok(&self.bytes[range])
    }

    pub fn frame_mut(&mut self, frame_idx: usize) -> Result<&mut [u8]> {
        let range = self.frame_idx_to_range(frame_idx)?;

        Ok(&mut self.bytes[range])
    }
}

/// Espaço de endereçamento virtual visto pelos programas.
pub trait AddressSpace {
    fn size(&self) -> usize;

    fn read(&mut self, address: usize) -> Result<u8>;

    fn write(&mut self, address: usize, value: u8) -> Result<()>;

    fn read_u32(&mut self, address: usize) -> Result<u32> {
        let mut bytes = [0u8; 4];

        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = self.read(word_byte(address, i, self.size())?)?;
        }

        Ok(u32::from_le_bytes(bytes))
    }

    fn write_u32(&mut self, address: usize, value: u32) -> Result<()> {
        for (i, byte) in value.to_le_bytes().into_iter().enumerate() {
            self.write(word_byte(address, i, self.size())?, byte)?;
        }

        Ok(())
    }
}

fn word_byte(address: usize, i: usize, size: usize) -> Result<usize> {
    address
        .checked_add(i)
        .ok_or_else(|| VmError::out_of_range("address", address, size))
}

/// Simulador da page table: traduz endereços, detecta faults e chama o
/// [`FaultResolver`] antes de refazer o acesso.
pub struct Mmu<R: PageReplacer, D: BlockStore> {
    page_size: usize,
    virtual_size: usize,
    memory: PhysicalMemory,
    page_table: PageTable,
    resolver: FaultResolver<R, D>,
}

impl<R, D> Mmu<R, D>
where
    R: PageReplacer,
    D: BlockStore,
{
    pub fn new(
        page_count: usize,
        frame_count: usize,
        page_size: usize,
        replacer: R,
        disk: D,
    ) -> Result<Self> {
        let geometry = || VmError::InvalidGeometry {
            npages: page_count,
            nframes: frame_count,
        };

        if page_count == 0 || frame_count == 0 || page_size == 0 || disk.block_count() < page_count {
            return Err(geometry());
        }

        let virtual_size = page_count.checked_mul(page_size).ok_or_else(geometry)?;

        debug!(
            "mmu: {} páginas, {} frames, {} bytes por página",
            page_count, frame_count, page_size
        );

        Ok(Mmu {
            page_size,
            virtual_size,
            memory: PhysicalMemory::new(frame_count, page_size).ok_or_else(geometry)?,
            page_table: PageTable::new(page_count).ok_or_else(geometry)?,
            resolver: FaultResolver::new(frame_count, replacer, disk).ok_or_else(geometry)?,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        self.page_table.len()
    }

    pub fn frame_count(&self) -> usize {
        self.memory.frame_count()
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn frame_table(&self) -> &FrameTable {
        self.resolver.frame_table()
    }

    pub fn stats(&self) -> FaultStats {
        self.resolver.stats()
    }

    pub fn disk(&self) -> &D {
        self.resolver.disk()
    }

    /// Encerra a simulação, devolvendo os contadores finais e o disco.
    pub fn finish(self) -> (FaultStats, D) {
        let stats = self.resolver.stats();

        (stats, self.resolver.into_disk())
    }

    /// Trata um fault em `page_number` como se viesse do hardware.
    pub fn handle_page_fault(&mut self, page_number: usize) -> Result<FaultOutcome> {
        let outcome = self
            .resolver
            .resolve(page_number, &mut self.page_table, &mut self.memory)?;

        debug!(
            "mmu: página {:#06X} {}",
            page_number,
            self.page_table.get(page_number)?
        );

        Ok(outcome)
    }

    /// Confere que page table e frame table concordam: cada frame ocupado
    /// aponta para a única página presente nele, e vice-versa.
    pub fn check_consistency(&self) -> Result<()> {
        let frames = self.resolver.frame_table();

        for (page_number, state) in self.page_table.iter() {
            if let Some(frame_idx) = state.frame() {
                if frames.occupant_of(frame_idx)? != Some(page_number) {
                    return Err(VmError::InvariantViolation(format!(
                        "page {} maps to frame {} owned by {:?}",
                        page_number,
                        frame_idx,
                        frames.occupant_of(frame_idx)?
                    )));
                }
            }
        }

        for (frame_idx, occupant) in frames.iter() {
            if let Some(page_number) = occupant {
                if self.page_table.get(page_number)?.frame() != Some(frame_idx) {
                    return Err(VmError::InvariantViolation(format!(
                        "frame {} owned by page {} which is not mapped there",
                        frame_idx, page_number
                    )));
                }
            }
        }

        Ok(())
    }

    fn translate_addr(&mut self, address: usize, access: Access) -> Result<(Range<usize>, usize)> {
        if address >= self.virtual_size {
            return Err(VmError::out_of_range("address", address, self.virtual_size));
        }

        let page_number = address / self.page_size;
        let page_offset = address % self.page_size;

        trace!(
            "mmu: acesso {:?} addr {:#06X} page_num={:#02X} page_offset={:#02X}",
            access,
            address,
            page_number,
            page_offset
        );

        // Uma escrita numa página inválida gera dois faults, como no hardware:
        // o primeiro carrega a página somente leitura, o segundo libera a
        // escrita.
        let mut faults = 0;
        let frame_idx = loop {
            let state = self.page_table.get(page_number)?;

            match state.frame() {
                Some(frame_idx) if state.permits(access) => break frame_idx,
                _ if faults < 2 => {
                    trace!("mmu: page fault! tratando...");

                    self.handle_page_fault(page_number)?;
                    faults += 1;
                }
                _ => {
                    return Err(VmError::InvariantViolation(format!(
                        "page {} still not accessible for {:?} after fault: {}",
                        page_number, access, state
                    )))
                }
            }
        };

        let start = frame_idx * self.page_size;

        Ok((start..start + self.page_size, page_offset))
    }
}

impl<R, D> AddressSpace for Mmu<R, D>
where
    R: PageReplacer,
    D: BlockStore,
{
    fn size(&self) -> usize {
        self.virtual_size
    }

    fn read(&mut self, address: usize) -> Result<u8> {
        let (frame_range, page_offset) = self.translate_addr(address, Access::Read)?;

        Ok(self.memory.bytes[frame_range][page_offset])
    }

    fn write(&mut self, address: usize, value: u8) -> Result<()> {
        let (frame_range, page_offset) = self.translate_addr(address, Access::Write)?;

        self.memory.bytes[frame_range][page_offset] = value;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{disk::MemoryDisk, page_replacer::FIFOPageReplacer, page_table::PageState};

    fn mmu(npages: usize, nframes: usize) -> Mmu<FIFOPageReplacer, MemoryDisk> {
        Mmu::new(
            npages,
            nframes,
            16,
            FIFOPageReplacer::new(),
            MemoryDisk::new(npages, 16),
        )
        .unwrap()
    }

    #[test]
    fn read_faults_once_then_hits() {
        let mut mmu = mmu(4, 2);

        assert_eq!(mmu.read(0x05).unwrap(), 0);
        assert_eq!(mmu.read(0x06).unwrap(), 0);

        assert_eq!(mmu.stats().faults, 1);
        assert_eq!(mmu.page_table().get(0).unwrap(), PageState::PresentClean { frame: 0 });
        assert_eq!(mmu.frame_table().occupant_of(0).unwrap(), Some(0));
        assert_eq!(mmu.frame_table().occupant_of(1).unwrap(), None);
    }

    #[test]
    fn write_after_read_upgrades() {
        let mut mmu = mmu(4, 2);

        mmu.read(0x10).unwrap();
        mmu.write(0x11, 0xAA).unwrap();
        mmu.write(0x12, 0xBB).unwrap();

        assert_eq!(
            mmu.stats(),
            FaultStats { faults: 2, disk_reads: 1, disk_writes: 0 }
        );
        assert_eq!(mmu.page_table().get(1).unwrap(), PageState::PresentDirty { frame: 0 });
        assert_eq!(mmu.read(0x11).unwrap(), 0xAA);
    }

    #[test]
    fn first_write_faults_twice() {
        let mut mmu = mmu(4, 2);

        mmu.write(0x00, 1).unwrap();

        assert_eq!(
            mmu.stats(),
            FaultStats { faults: 2, disk_reads: 1, disk_writes: 0 }
        );
    }

    #[test]
    fn data_survives_eviction() {
        let mut mmu = mmu(4, 1);

        mmu.write(0x03, 0x42).unwrap();
        mmu.read(0x13).unwrap();
        mmu.read(0x23).unwrap();

        assert_eq!(mmu.read(0x03).unwrap(), 0x42);
        assert_eq!(mmu.stats().disk_writes, 1);
        mmu.check_consistency().unwrap();
    }

    #[test]
    fn address_out_of_range() {
        let mut mmu = mmu(2, 1);

        assert!(matches!(
            mmu.read(32),
            Err(VmError::OutOfRange { what: "address", index: 32, bound: 32 })
        ));
        assert_eq!(mmu.stats().faults, 0);
    }

    #[test]
    fn rejects_empty_geometry() {
        let result = Mmu::new(4, 0, 16, FIFOPageReplacer::new(), MemoryDisk::new(4, 16));

        assert!(matches!(
            result,
            Err(VmError::InvalidGeometry { npages: 4, nframes: 0 })
        ));
    }

    #[test]
    fn geometry_accessors() {
        let mmu = mmu(4, 2);

        assert_eq!(mmu.page_count(), 4);
        assert_eq!(mmu.frame_count(), 2);
        assert_eq!(mmu.page_size(), 16);
        assert_eq!(mmu.size(), 64);
    }

    #[test]
    fn physical_memory_size_overflow_is_refused() {
        let result = Mmu::new(
            4,
            usize::MAX / 2,
            4096,
            FIFOPageReplacer::new(),
            MemoryDisk::new(4, 4096),
        );

        assert!(matches!(
            result,
            Err(VmError::InvalidGeometry { npages: 4, nframes }) if nframes == usize::MAX / 2
        ));
    }

    #[test]
    fn unallocatable_frames_are_refused() {
        // 2^62 bytes não estoura usize, mas nenhum host aloca isso
        let result = Mmu::new(4, 1 << 62, 1, FIFOPageReplacer::new(), MemoryDisk::new(4, 1));

        assert!(matches!(result, Err(VmError::InvalidGeometry { npages: 4, .. })));
    }

    #[test]
    fn word_access_near_usize_max() {
        let mut mmu = mmu(2, 1);

        assert!(matches!(
            mmu.read_u32(usize::MAX - 1),
            Err(VmError::OutOfRange { what: "address", .. })
        ));
        assert!(matches!(
            mmu.write_u32(usize::MAX - 2, 7),
            Err(VmError::OutOfRange { what: "address", .. })
        ));
        assert_eq!(mmu.stats().faults, 0);
    }

    #[test]
    fn rejects_disk_smaller_than_address_space() {
        let result = Mmu::new(8, 2, 16, FIFOPageReplacer::new(), MemoryDisk::new(4, 16));

        assert!(matches!(result, Err(VmError::InvalidGeometry { .. })));
    }

    #[test]
    fn word_access_is_little_endian() {
        let mut mmu = mmu(2, 2);

        mmu.write_u32(4, 0x1234_5678).unwrap();

        assert_eq!(mmu.read(4).unwrap(), 0x78);
        assert_eq!(mmu.read_u32(4).unwrap(), 0x1234_5678);
    }
}

//! Resolução de page faults.
//!
//! Um fault chega por dois motivos: a página não está em nenhum frame, ou é
//! uma escrita numa página residente somente leitura. O segundo caso só troca
//! a permissão. O primeiro pede um frame ao [`PageReplacer`], despeja quem
//! estiver nele (salvando no disco se estiver suja) e carrega a página nova.

use log::{debug, trace};

use crate::{
    disk::BlockStore,
    error::{Result, VmError},
    frame_table::FrameTable,
    mmu::PhysicalMemory,
    page_replacer::{FrameEvent, PageReplacer},
    page_table::{PageState, PageTable},
    stats::FaultStats,
};

/// Página removida de um frame para dar lugar a outra.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Eviction {
    pub page: usize,
    pub written_back: bool,
}

/// O que o resolver fez com um fault.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FaultOutcome {
    /// Página limpa passou a gravável no mesmo frame, sem I/O.
    Upgraded { frame: usize },
    /// Página carregada do disco em `frame`.
    Loaded {
        frame: usize,
        evicted: Option<Eviction>,
    },
}

impl FaultOutcome {
    pub fn frame(&self) -> usize {
        match *self {
            FaultOutcome::Upgraded { frame } | FaultOutcome::Loaded { frame, .. } => frame,
        }
    }
}

pub struct FaultResolver<R: PageReplacer, D: BlockStore> {
    frame_table: FrameTable,
    replacer: R,
    disk: D,
    stats: FaultStats,
}

impl<R, D> FaultResolver<R, D>
where
    R: PageReplacer,
    D: BlockStore,
{
    /// `None` se a frame table não couber na memória.
    pub fn new(frame_count: usize, replacer: R, disk: D) -> Option<Self> {
        Some(FaultResolver {
            frame_table: FrameTable::new(frame_count)?,
            replacer,
            disk,
            stats: FaultStats::default(),
        })
    }

    pub fn stats(&self) -> FaultStats {
        self.stats
    }

    pub fn frame_table(&self) -> &FrameTable {
        &self.frame_table
    }

    pub fn replacer(&self) -> &R {
        &self.replacer
    }

    pub fn disk(&self) -> &D {
        &self.disk
    }

    /// Devolve o disco, encerrando a simulação.
    pub fn into_disk(self) -> D {
        self.disk
    }

    /// Trata um fault na página `page_number`. Na volta, a página está
    /// presente e o acesso que gerou o fault pode ser refeito.
    pub fn resolve(
        &mut self,
        page_number: usize,
        page_table: &mut PageTable,
        memory: &mut PhysicalMemory,
    ) -> Result<FaultOutcome> {
        self.stats.faults += 1;

        match page_table.get(page_number)? {
            PageState::PresentClean { frame } => {
                page_table.set(page_number, PageState::PresentDirty { frame })?;

                debug!("fault: página {} agora gravável no frame {}", page_number, frame);

                Ok(FaultOutcome::Upgraded { frame })
            }
            PageState::PresentDirty { frame } => Err(VmError::InvariantViolation(format!(
                "page {} faulted while writable in frame {}",
                page_number, frame
            ))),
            PageState::Invalid => self.load(page_number, page_table, memory),
        }
    }

    fn load(
        &mut self,
        page_number: usize,
        page_table: &mut PageTable,
        memory: &mut PhysicalMemory,
    ) -> Result<FaultOutcome> {
        let frame_idx = self.replacer.pick_victim_frame(memory.frame_count());

        let evicted = match self.frame_table.occupant_of(frame_idx)? {
            Some(victim) => Some(self.evict(victim, frame_idx, page_table, memory)?),
            None => None,
        };

        self.disk.read_block(page_number, memory.frame_mut(frame_idx)?)?;
        self.stats.disk_reads += 1;

        debug!("fault: página {} carregada no frame {}", page_number, frame_idx);

        page_table.set(page_number, PageState::PresentClean { frame: frame_idx })?;
        self.frame_table.assign(frame_idx, page_number)?;
        self.replacer.frame_event(FrameEvent::Filled(frame_idx));

        Ok(FaultOutcome::Loaded {
            frame: frame_idx,
            evicted,
        })
    }

    fn evict(
        &mut self,
        victim: usize,
        frame_idx: usize,
        page_table: &mut PageTable,
        memory: &mut PhysicalMemory,
    ) -> Result<Eviction> {
        let written_back = match page_table.get(victim)? {
            PageState::PresentDirty { frame } if frame == frame_idx => {
                debug!("fault: página {} suja, salvando antes de sobrescrever", victim);

                self.disk.write_block(victim, memory.frame(frame_idx)?)?;
                self.stats.disk_writes += 1;

                true
            }
            PageState::PresentClean { frame } if frame == frame_idx => {
                trace!("fault: página {} limpa, descartando", victim);

                false
            }
            other => {
                return Err(VmError::InvariantViolation(format!(
                    "frame {} owned by page {} but page entry is {:?}",
                    frame_idx, victim, other
                )))
            }
        };

        page_table.set(victim, PageState::Invalid)?;
        self.frame_table.clear(frame_idx)?;

        Ok(Eviction {
            page: victim,
            written_back,
        })
    }
}

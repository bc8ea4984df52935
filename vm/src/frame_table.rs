use crate::error::{Result, VmError};

/// Mapa reverso frame -> página. É só uma tabela de lookup; quem mantém a
/// consistência com a [`PageTable`](crate::page_table::PageTable) é o resolver.
pub struct FrameTable {
    occupants: Vec<Option<usize>>,
}

impl FrameTable {
    /// Todos os frames começam desocupados. `None` se a tabela não couber na
    /// memória.
    pub fn new(frame_count: usize) -> Option<Self> {
        Some(FrameTable {
            occupants: crate::try_filled(frame_count, None)?,
        })
    }

    pub fn occupant_of(&self, frame_index: usize) -> Result<Option<usize>> {
        self.occupants
            .get(frame_index)
            .copied()
            .ok_or_else(|| VmError::out_of_range("frame", frame_index, self.occupants.len()))
    }

    pub fn assign(&mut self, frame_index: usize, page_number: usize) -> Result<()> {
        *self.slot_mut(frame_index)? = Some(page_number);

        Ok(())
    }

    pub fn clear(&mut self, frame_index: usize) -> Result<()> {
        *self.slot_mut(frame_index)? = None;

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
        self.occupants.iter().copied().enumerate()
    }

    fn slot_mut(&mut self, frame_index: usize) -> Result<&mut Option<usize>> {
        let bound = self.occupants.len();

        self.occupants
            .get_mut(frame_index)
            .ok_or_else(|| VmError::out_of_range("frame", frame_index, bound))
    }
}

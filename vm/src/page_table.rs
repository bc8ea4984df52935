use std::fmt;

use crate::error::{Result, VmError};

/// Estado de presença/permissão de uma página virtual.
///
/// O frame só existe nos estados presentes, então "suja mas sem frame" não é
/// representável.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PageState {
    /// Página não está em nenhum frame.
    #[default]
    Invalid,
    /// Residente, somente leitura, igual à cópia no disco.
    PresentClean { frame: usize },
    /// Residente, leitura e escrita, escrita desde o carregamento.
    PresentDirty { frame: usize },
}

impl PageState {
    pub fn frame(&self) -> Option<usize> {
        match *self {
            PageState::Invalid => None,
            PageState::PresentClean { frame } | PageState::PresentDirty { frame } => Some(frame),
        }
    }

    pub fn is_present(&self) -> bool {
        self.frame().is_some()
    }

    pub fn permits(&self, access: Access) -> bool {
        match (self, access) {
            (PageState::Invalid, _) => false,
            (PageState::PresentClean { .. }, Access::Write) => false,
            _ => true,
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageState::Invalid => write!(f, "frame=- bits=---"),
            PageState::PresentClean { frame } => write!(f, "frame={} bits=r--", frame),
            PageState::PresentDirty { frame } => write!(f, "frame={} bits=rw-", frame),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Uma entrada por página virtual, indexada pelo page number.
pub struct PageTable {
    table: Vec<PageState>,
}

impl PageTable {
    /// Todas as páginas começam inválidas. `None` se a tabela não couber na
    /// memória.
    pub fn new(page_count: usize) -> Option<Self> {
        Some(PageTable {
            table: crate::try_filled(page_count, PageState::Invalid)?,
        })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, page_number: usize) -> Result<PageState> {
        self.table
            .get(page_number)
            .copied()
            .ok_or_else(|| VmError::out_of_range("page", page_number, self.table.len()))
    }

    pub fn set(&mut self, page_number: usize, state: PageState) -> Result<()> {
        let bound = self.table.len();
        let entry = self
            .table
            .get_mut(page_number)
            .ok_or_else(|| VmError::out_of_range("page", page_number, bound))?;

        *entry = state;

        Ok(())
    }

    /// Itera sobre `(page_number, estado)` de todas as páginas.
    pub fn iter(&self) -> impl Iterator<Item = (usize, PageState)> + '_ {
        self.table.iter().copied().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_invalid() {
        let table = PageTable::new(4).unwrap();

        assert!(!table.is_empty());
        assert!(table.iter().all(|(_, state)| state == PageState::Invalid));
    }

    #[test]
    fn set_then_get() {
        let mut table = PageTable::new(4).unwrap();

        table.set(2, PageState::PresentClean { frame: 1 }).unwrap();

        assert_eq!(table.get(2).unwrap(), PageState::PresentClean { frame: 1 });
        assert_eq!(table.get(2).unwrap().frame(), Some(1));
        assert_eq!(table.get(3).unwrap(), PageState::Invalid);
    }

    #[test]
    fn out_of_range_page() {
        let mut table = PageTable::new(4).unwrap();

        assert!(matches!(
            table.get(4),
            Err(VmError::OutOfRange { index: 4, bound: 4, .. })
        ));
        assert!(table.set(7, PageState::Invalid).is_err());
    }

    #[test]
    fn permissions() {
        let clean = PageState::PresentClean { frame: 0 };
        let dirty = PageState::PresentDirty { frame: 0 };

        assert!(!PageState::Invalid.permits(Access::Read));
        assert!(!PageState::Invalid.permits(Access::Write));
        assert!(clean.permits(Access::Read));
        assert!(!clean.permits(Access::Write));
        assert!(dirty.permits(Access::Read));
        assert!(dirty.permits(Access::Write));
    }
}

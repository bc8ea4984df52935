//! Simulador de memória virtual paginada sob demanda.
//!
//! O núcleo é o [`fault::FaultResolver`], que decide qual frame físico usar
//! a cada page fault, se há uma vítima a ser removida (e salva no disco) e
//! como atualizar o estado de cada página. Todo o resto ([`mmu::Mmu`],
//! [`disk::MemoryDisk`], [`programs`]) existe para exercitar o resolver.

pub mod disk;
pub mod error;
pub mod fault;
pub mod frame_table;
pub mod mmu;
pub mod page_replacer;
pub mod page_table;
pub mod programs;
pub mod stats;

pub use error::{Result, VmError};

/// Tamanho padrão de uma página (e de um bloco no disco), em bytes.
pub const PAGE_SIZE: usize = 4096;

/// Aloca `len` cópias de `value` sem abortar o processo: devolve `None` se a
/// memória do host não der conta.
pub(crate) fn try_filled<T: Clone>(len: usize, value: T) -> Option<Vec<T>> {
    let mut items = Vec::new();
    items.try_reserve_exact(len).ok()?;
    items.resize(len, value);

    Some(items)
}

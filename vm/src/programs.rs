//! Programas sintéticos que geram o padrão de acessos da simulação.
//!
//! Todos são determinísticos (PRNG com semente fixa) e percorrem o espaço de
//! endereçamento inteiro. Cada um devolve um checksum do que leu.

use std::str::FromStr;

use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{
    error::{Result, VmError},
    mmu::AddressSpace,
};

const SORT_SEED: u64 = 4856;
const FOCUS_SEED: u64 = 38290;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Program {
    Sort,
    Scan,
    Focus,
}

impl Program {
    pub fn name(&self) -> &'static str {
        match self {
            Program::Sort => "sort",
            Program::Scan => "scan",
            Program::Focus => "focus",
        }
    }

    pub fn run<A: AddressSpace + ?Sized>(&self, memory: &mut A) -> Result<u64> {
        info!("programs: rodando {} sobre {} bytes", self.name(), memory.size());

        match self {
            Program::Sort => sort_program(memory),
            Program::Scan => scan_program(memory),
            Program::Focus => focus_program(memory),
        }
    }
}

impl FromStr for Program {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sort" => Ok(Program::Sort),
            "scan" => Ok(Program::Scan),
            "focus" => Ok(Program::Focus),
            other => Err(VmError::UnknownProgram(other.to_string())),
        }
    }
}

/// Preenche com palavras aleatórias, ordena no lugar e soma.
pub fn sort_program<A: AddressSpace + ?Sized>(memory: &mut A) -> Result<u64> {
    let words = memory.size() / 4;
    let mut rng = ChaCha8Rng::seed_from_u64(SORT_SEED);

    for i in 0..words {
        memory.write_u32(i * 4, rng.random())?;
    }

    quicksort(memory, words)?;

    let mut total = 0u64;
    for i in 0..words {
        total = total.wrapping_add(memory.read_u32(i * 4)? as u64);
    }

    Ok(total)
}

/// Escreve `i % 256` em cada byte e depois lê tudo dez vezes.
pub fn scan_program<A: AddressSpace + ?Sized>(memory: &mut A) -> Result<u64> {
    let length = memory.size();

    for i in 0..length {
        memory.write(i, (i % 256) as u8)?;
    }

    let mut total = 0u64;
    for _ in 0..10 {
        for i in 0..length {
            total += memory.read(i)? as u64;
        }
    }

    Ok(total)
}

/// Zera tudo, faz rajadas de escritas concentradas em janelas pequenas e
/// soma.
pub fn focus_program<A: AddressSpace + ?Sized>(memory: &mut A) -> Result<u64> {
    const BURSTS: usize = 100;
    const WRITES_PER_BURST: usize = 100;
    const WINDOW: usize = 25;

    let length = memory.size();
    let mut rng = ChaCha8Rng::seed_from_u64(FOCUS_SEED);

    for i in 0..length {
        memory.write(i, 0)?;
    }

    for _ in 0..BURSTS {
        let start = rng.random_range(0..length);

        for _ in 0..WRITES_PER_BURST {
            let address = (start + rng.random_range(0..WINDOW)) % length;
            memory.write(address, rng.random())?;
        }
    }

    let mut total = 0u64;
    for i in 0..length {
        total += memory.read(i)? as u64;
    }

    Ok(total)
}

/// Quicksort com pilha explícita sobre as `words` primeiras palavras.
fn quicksort<A: AddressSpace + ?Sized>(memory: &mut A, words: usize) -> Result<()> {
    let mut pending = vec![(0usize, words)];

    while let Some((lo, hi)) = pending.pop() {
        if hi - lo < 2 {
            continue;
        }

        let pivot = memory.read_u32((hi - 1) * 4)?;
        let mut store = lo;

        for i in lo..hi - 1 {
            let value = memory.read_u32(i * 4)?;

            if value < pivot {
                swap_words(memory, i, store)?;
                store += 1;
            }
        }

        swap_words(memory, store, hi - 1)?;

        pending.push((lo, store));
        pending.push((store + 1, hi));
    }

    Ok(())
}

fn swap_words<A: AddressSpace + ?Sized>(memory: &mut A, a: usize, b: usize) -> Result<()> {
    if a == b {
        return Ok(());
    }

    let x = memory.read_u32(a * 4)?;
    let y = memory.read_u32(b * 4)?;

    memory.write_u32(a * 4, y)?;
    memory.write_u32(b * 4, x)
}

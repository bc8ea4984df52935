//! FileDisk - Implementação do BlockStore que usa um arquivo no sistema de
//! arquivos como disco virtual.
//!
//! Diferente de um swap file de verdade, aqui não há header nenhum: o
//! arquivo é uma sequência plana de blocos, um por página, e o bloco `i`
//! começa no byte `i * block_size`.
//!
//! | descrição | tamanho          |
//! |-----------|------------------|
//! | bloco 0   | block_size bytes |
//! | bloco 1   | block_size bytes |
//! | ...       | ...              |
//! | bloco N-1 | block_size bytes |
//!
//! Na abertura o arquivo é truncado para `N * block_size` bytes, então todas
//! as páginas começam zeradas.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use log::{debug, trace};
use vm::{disk::BlockStore, Result, VmError};

/// Quantos bytes do bloco aparecem no log de trace.
const TRACE_PREFIX: usize = 16;

/// O disco que lê e escreve num arquivo.
#[derive(Debug)]
pub struct FileDisk {
    /// O arquivo de apoio.
    file: File,
    /// Tamanho de cada bloco (igual ao tamanho de página).
    block_size: usize,
    /// Número de blocos.
    block_count: usize,
}

impl FileDisk {
    /// Cria (ou recria) o arquivo com espaço para `block_count` blocos.
    pub fn create<P: AsRef<Path>>(filename: P, block_count: usize, block_size: usize) -> Result<FileDisk> {
        let len = block_count
            .checked_mul(block_size)
            .and_then(|len| u64::try_from(len).ok())
            .ok_or(VmError::OutOfRange {
                what: "block count",
                index: block_count,
                bound: usize::MAX / block_size.max(1),
            })?;

        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(filename.as_ref())?;

        file.set_len(len)?;

        debug!(
            "file_disk: {} com {} blocos de {} bytes",
            filename.as_ref().display(),
            block_count,
            block_size
        );

        Ok(FileDisk {
            file,
            block_size,
            block_count,
        })
    }

    /// Posiciona o cursor do arquivo no começo do bloco.
    fn seek_block(&mut self, block: usize) -> Result<()> {
        if block >= self.block_count {
            return Err(VmError::OutOfRange {
                what: "block",
                index: block,
                bound: self.block_count,
            });
        }

        self.file
            .seek(SeekFrom::Start((block * self.block_size) as u64))?;

        Ok(())
    }

    /// Garante que tudo foi parar no arquivo.
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        self.file.sync_all()?;

        Ok(())
    }
}

impl BlockStore for FileDisk {
    fn read_block(&mut self, block: usize, target: &mut [u8]) -> Result<()> {
        self.seek_block(block)?;

        let len = target.len().min(self.block_size);
        self.file.read_exact(&mut target[..len])?;

        trace!(
            "file_disk: leu bloco {} [{}..]",
            block,
            hex::encode(&target[..len.min(TRACE_PREFIX)])
        );

        Ok(())
    }

    fn write_block(&mut self, block: usize, buffer: &[u8]) -> Result<()> {
        self.seek_block(block)?;

        let len = buffer.len().min(self.block_size);
        self.file.write_all(&buffer[..len])?;

        trace!(
            "file_disk: escreveu bloco {} [{}..]",
            block,
            hex::encode(&buffer[..len.min(TRACE_PREFIX)])
        );

        Ok(())
    }

    fn block_count(&self) -> usize {
        self.block_count
    }
}

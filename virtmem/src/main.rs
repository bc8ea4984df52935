mod file_disk;

use std::{path::PathBuf, process};

use clap::Parser;
use log::info;
use vm::{
    mmu::Mmu,
    page_replacer::ReplacementPolicy,
    programs::Program,
    stats::FaultStats,
    VmError, PAGE_SIZE,
};

use file_disk::FileDisk;

#[derive(Parser)]
#[command(name = "virtmem")]
#[command(about = "Simulador de memória virtual paginada sob demanda")]
#[command(override_usage = "virtmem <npages> <nframes> <rand|fifo|custom> <sort|scan|focus>")]
struct Cli {
    /// Número de páginas virtuais
    #[arg(value_parser = parse_count)]
    npages: usize,

    /// Número de frames físicos
    #[arg(value_parser = parse_count)]
    nframes: usize,

    /// Política de substituição (rand, fifo)
    algorithm: String,

    /// Programa a executar (sort, scan, focus)
    program: String,

    /// Semente da política aleatória
    #[arg(long)]
    seed: Option<u64>,

    /// Arquivo do disco virtual
    #[arg(long, default_value = "myvirtualdisk")]
    disk: PathBuf,

    /// Tamanho da página em bytes
    #[arg(long, default_value_t = PAGE_SIZE)]
    page_size: usize,
}

/// Igual ao `atoi`: usa os dígitos iniciais e devolve 0 se não houver
/// nenhum.
fn parse_count(arg: &str) -> Result<usize, String> {
    let digits: String = arg
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    Ok(digits.parse().unwrap_or(0))
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let policy = match cli.algorithm.parse::<ReplacementPolicy>() {
        Ok(policy) => policy,
        Err(_) => {
            println!("Algorithm not found");
            process::exit(1);
        }
    };

    match run(&cli, policy) {
        Ok(stats) => println!("{}", stats),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Roda a simulação inteira e devolve os contadores finais. Programa
/// desconhecido é reportado, mas não interrompe a execução.
fn run(cli: &Cli, policy: ReplacementPolicy) -> Result<FaultStats, VmError> {
    let disk = FileDisk::create(&cli.disk, cli.npages, cli.page_size)?;

    let mut mmu = Mmu::new(
        cli.npages,
        cli.nframes,
        cli.page_size,
        policy.build(cli.seed),
        disk,
    )?;

    info!(
        "virtmem: {} páginas, {} frames, política {:?}",
        cli.npages, cli.nframes, policy
    );

    match cli.program.parse::<Program>() {
        Ok(program) => {
            let total = program.run(&mut mmu)?;
            println!("{} result is {}", program.name(), total);
        }
        Err(e) => eprintln!("{}", e),
    }

    let (stats, disk) = mmu.finish();
    disk.close()?;

    Ok(stats)
}

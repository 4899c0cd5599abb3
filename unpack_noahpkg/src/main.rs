use std::{
    io::{stdout, BufWriter, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use noahpkg::{extract_file, ExtractedItem, Extraction};

/// Unpacks the sub-images of a Noah upgrade container
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the upgrade container (upgrade.bin)
    upgrade_bin: PathBuf,

    /// Output directory of the unpacked images
    #[arg(default_value = "out")]
    out: PathBuf,

    /// Text output format
    #[arg(value_enum, long, default_value_t = TextOutputFormat::Info)]
    format: TextOutputFormat,

    /// Output null-terminated manifest fields
    #[arg(short = '0', long)]
    null: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum TextOutputFormat {
    /// Pretty-printed info-rich text format suitable for human inspection
    Info,
    /// One record per item: index, offset, length, checksum, file and device,
    /// shell-escaped (quoted)
    Manifest,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    log::debug!("unpacking {} into {}", args.upgrade_bin.display(), args.out.display());

    let extraction = extract_file(&args.upgrade_bin, &args.out)
        .with_context(|| format!("cannot unpack {}", args.upgrade_bin.display()))?;

    let mut w = BufWriter::new(stdout().lock());
    match args.format {
        TextOutputFormat::Info => print_info(&mut w, &extraction)?,
        TextOutputFormat::Manifest => {
            for item in &extraction.items {
                print_manifest_record(&mut w, item, args.null)?;
            }
        }
    }
    w.flush()?;

    if !extraction.is_complete() {
        eprintln!("{} item(s) failed:", extraction.failures.len());
        for err in &extraction.failures {
            eprintln!("  {err}");
        }
    }
    Ok(())
}

fn print_info(w: &mut impl Write, extraction: &Extraction) -> anyhow::Result<()> {
    writeln!(w, "container tag: 0x{:016x}", extraction.header.tag)?;
    writeln!(w, "container version: {}", extraction.header.version)?;
    for item in &extraction.items {
        let desc = &item.descriptor;
        writeln!(w)?;
        writeln!(w, "item: {}", item.index)?;
        writeln!(w, "length: {}", desc.length)?;
        writeln!(w, "offset: {}", desc.offset)?;
        writeln!(w, "version: {}", desc.version)?;
        writeln!(w, "fstype: {}", desc.fstype)?;
        writeln!(w, "checksum: 0x{:08X}", desc.checksum)?;
        write!(w, "dev: ")?;
        w.write_all(desc.device.as_bytes())?;
        writeln!(w)?;
        writeln!(w, "file: {}", item.name)?;
    }
    Ok(())
}

fn print_manifest_record(w: &mut impl Write, item: &ExtractedItem, null: bool) -> anyhow::Result<()> {
    let sep = if null { '\0' } else { ' ' };
    let desc = &item.descriptor;
    write!(
        w,
        "{}{sep}{}{sep}{}{sep}0x{:08x}{sep}",
        item.index, desc.offset, desc.length, desc.checksum
    )?;
    if null {
        w.write_all(item.name.as_bytes())?;
        write!(w, "{sep}")?;
        w.write_all(desc.device.as_bytes())?;
        write!(w, "\0")?;
    } else {
        let q = shlex::bytes::Quoter::new();
        w.write_all(&q.quote(item.name.as_bytes())?)?;
        write!(w, "{sep}")?;
        w.write_all(&q.quote(desc.device.as_bytes())?)?;
        writeln!(w)?;
    }
    Ok(())
}

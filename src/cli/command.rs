use std::error::Error;
use std::fs::File;

use clap::ArgMatches;
use colored::*;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::fs::FileSystem;

pub fn dispatch(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    match matches.subcommand() {
        ("create", Some(m)) => create(m),
        ("copyin", Some(m)) => copyin(m),
        ("copyout", Some(m)) => copyout(m),
        ("ls", Some(m)) => ls(m),
        ("rm", Some(m)) => rm(m),
        ("map", Some(m)) => map(m),
        ("rmdisk", Some(m)) => rmdisk(m),
        _ => unreachable!("subcommand is required by clap settings"),
    }
}

fn image(m: &ArgMatches) -> FileSystem {
    FileSystem::new(m.value_of("image").unwrap())
}

fn create(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let size: u64 = m
        .value_of("size")
        .unwrap()
        .parse()
        .map_err(|_| "size must be a byte count")?;

    let fs = image(m);
    let report = fs.format(size)?;
    println!(
        "💾 Created image {}",
        fs.path().display().to_string().green()
    );
    println!(
        "   {} data blocks, {} bytes on disk",
        report.block_count, report.total_size
    );
    Ok(())
}

fn copyin(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let src_path = m.value_of("source").unwrap();
    let name = m.value_of("name").unwrap();

    let file = File::open(src_path)?;
    let size = file.metadata()?.len();

    let pb = transfer_bar(size);
    let mut reader = pb.wrap_read(file);

    let fs = image(m);
    let index = fs.import(&mut reader, size, name)?;
    pb.finish_and_clear();

    println!(
        "📥 Imported {} as '{}' (inode={}, {} bytes)",
        src_path.cyan(),
        name.green(),
        index,
        size
    );
    Ok(())
}

fn copyout(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let name = m.value_of("name").unwrap();
    let dest = m.value_of("dest").unwrap();

    let file = File::create(dest)?;
    let pb = ProgressBar::new_spinner();
    let mut writer = pb.wrap_write(file);

    let fs = image(m);
    let size = fs.export(name, &mut writer)?;
    pb.finish_and_clear();

    println!(
        "📤 Exported '{}' to {} ({} bytes)",
        name.green(),
        dest.cyan(),
        size
    );
    Ok(())
}

fn ls(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let fs = image(m);
    let report = fs.list(m.is_present("all"))?;

    for entry in &report.entries {
        println!(
            "📄 inode={:<4} {:<32} {:>12} bytes  {} extent(s)",
            entry.index,
            entry.name.green(),
            entry.size,
            entry.extent_count
        );
    }
    println!(
        "{}",
        format!(
            "{} file(s), {}/{} blocks free",
            report.entries.len(),
            report.free_blocks,
            report.block_count
        )
        .bright_black()
    );
    Ok(())
}

fn rm(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let name = m.value_of("name").unwrap();
    image(m).remove(name)?;
    println!("🗑️  Deleted '{}'", name.red());
    Ok(())
}

fn map(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let fs = image(m);
    let report = fs.describe_layout(m.is_present("owners"))?;

    println!(
        "{}",
        format!("Image layout: {}", fs.path().display())
            .bright_yellow()
            .bold()
    );
    println!("  superblock offset:   0");
    println!("  inode table offset:  {}", report.inode_table_offset);
    println!("  block bitmap offset: {}", report.block_bitmap_offset);
    println!("  data offset:         {}", report.data_offset);
    println!(
        "  blocks: {} total, {} free",
        report.block_count, report.free_blocks
    );

    println!("Block map:");
    for run in &report.runs {
        let state = if run.used {
            "USED".red()
        } else {
            "FREE".green()
        };
        match &run.owner {
            Some(owner) => println!("  [{:>6}..{:>6}] {} ({})", run.start, run.end, state, owner),
            None => println!("  [{:>6}..{:>6}] {}", run.start, run.end, state),
        }
    }
    Ok(())
}

fn rmdisk(m: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let path = m.value_of("image").unwrap();

    if !m.is_present("force") {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete image file '{}'?", path))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    std::fs::remove_file(path)?;
    println!("🗑️  Removed image file '{}'", path.red());
    Ok(())
}

fn transfer_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );
    pb
}

use crate::cli::InspectArgs;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use idmirror_container::Container;

pub fn run(args: InspectArgs) -> Result<()> {
    let container = Container::open(&args.path).or_raise(|| ErrorKind::Inspect)?;
    println!("{} ({}, {} bytes)", container.path().display(), container.format(), container.size());
    println!("checksum {}", container.file_checksum());
    for member in container.members() {
        println!("  {:>10} {:>10}  {}", member.size, member.compressed_size, member.name);
    }
    let levels = container.levels();
    if !levels.is_empty() {
        println!("levels {}", levels.join(" "));
    }
    if args.extract.is_empty() {
        return Ok(());
    }
    let extraction = container.extract_to(args.extract.as_slice(), &args.to).or_raise(|| ErrorKind::Inspect)?;
    for member in &extraction.members {
        println!("extracted {} -> {} ({})", member.name, member.path.display(), member.checksum);
    }
    tracing::debug!(elapsed_ms = extraction.elapsed.as_millis() as u64, "Extraction finished");
    Ok(())
}

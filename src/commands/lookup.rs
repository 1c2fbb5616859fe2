use crate::cli::LookupArgs;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use idmirror_extract::{ArchiveRecord, PathResolver};
use std::path::Path;

pub async fn run(config: Option<&Path>, args: LookupArgs) -> Result<()> {
    let config = super::load_config(config)?;
    let mut repo = super::open_catalog(&config).await?;
    let record = repo.get_by_id(args.id).await.or_raise(|| ErrorKind::Catalog)?;
    repo.close().await.or_raise(|| ErrorKind::Catalog)?;
    let record = record.ok_or_raise(|| ErrorKind::NotCataloged(args.id))?;
    print!("{}", render(&record));
    Ok(())
}

fn render(record: &ArchiveRecord) -> String {
    let mut out = format!("{}: {}\n", record.id, record.path());
    let fields = [
        ("title", record.title.as_str()),
        ("author", record.author.as_str()),
        ("email", record.email.as_str()),
        ("base", record.base.as_str()),
        ("editors", record.editors.as_str()),
        ("buildtime", record.buildtime.as_str()),
        ("bugs", record.bugs.as_str()),
        ("credits", record.credits.as_str()),
        ("description", record.description.as_str()),
    ];
    for (name, value) in fields.into_iter().filter(|(_, value)| !value.is_empty()) {
        out.push_str(&format!("  {name}: {value}\n"));
    }
    out.push_str(&format!("  size: {}\n", record.size));
    if let Some(date) = record.date {
        out.push_str(&format!("  date: {date}\n"));
    }
    out.push_str(&format!("  rating: {:.2} ({} votes)\n", record.rating, record.vote_count));
    if let Some(checksum) = &record.checksum {
        out.push_str(&format!("  checksum: {checksum}\n"));
    }
    if !record.levels.is_empty() {
        out.push_str(&format!("  levels: {}\n", record.levels.join(" ")));
    }
    for review in &record.reviews {
        out.push_str(&format!("  [{}/5] {}\n", review.vote, review.text));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use idmirror_extract::Review;

    #[test]
    fn test_render_skips_empty_fields() {
        let mut record = ArchiveRecord::new(15156, "levels/doom2/Ports/megawads/", "av.zip")
            .with_inspection("af1349b9", vec!["MAP01".to_string()]);
        record.title = "Alien Vendetta".to_string();
        record.reviews = vec![Review::new("Classic.", 5)];
        let rendered = render(&record);
        assert!(rendered.starts_with("15156: levels/doom2/Ports/megawads/av.zip\n"));
        assert!(rendered.contains("  title: Alien Vendetta\n"));
        assert!(!rendered.contains("author"));
        assert!(rendered.contains("  levels: MAP01\n"));
        assert!(rendered.contains("  [5/5] Classic.\n"));
    }
}

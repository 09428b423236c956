//! Cache management commands.

use crate::cache::IssueCache;
use crate::error::Result;

pub fn cmd_cache_status() -> Result<()> {
    let cache = IssueCache::new()?;
    match cache.load() {
        Some(issues) => println!(
            "{} issues cached at {}",
            issues.len(),
            cache.path().display()
        ),
        None => println!("cache is empty ({})", cache.path().display()),
    }
    Ok(())
}

pub fn cmd_cache_path() -> Result<()> {
    let cache = IssueCache::new()?;
    println!("{}", cache.path().display());
    Ok(())
}

pub fn cmd_cache_clear() -> Result<()> {
    let cache = IssueCache::new()?;
    cache.clear()?;
    println!("cache cleared");
    Ok(())
}

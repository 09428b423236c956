mod attachment;
mod cache;
mod list;
mod options;
mod show;

pub use attachment::cmd_attachment;
pub use cache::{cmd_cache_clear, cmd_cache_path, cmd_cache_status};
pub use list::{ListOptions, cmd_list};
pub use options::cmd_options;
pub use show::{cmd_show, lookup_issue};

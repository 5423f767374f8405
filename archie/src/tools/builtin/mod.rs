//! Built-in tools

mod copy_from_extra;
mod create_file;
mod create_folder;
mod delete_file;
mod download_file;
mod file_info;
mod list_extra;
mod list_files;
mod move_file;
mod read_file;
mod run_command;
mod search_files;

pub use copy_from_extra::CopyFromExtraTool;
pub use create_file::CreateFileTool;
pub use create_folder::CreateFolderTool;
pub use delete_file::DeleteFileTool;
pub use download_file::DownloadFileTool;
pub use file_info::FileInfoTool;
pub use list_extra::ListExtraTool;
pub use list_files::ListFilesTool;
pub use move_file::MoveFileTool;
pub use read_file::ReadFileTool;
pub use run_command::RunCommandTool;
pub use search_files::SearchFilesTool;

/// Keep the first `max` characters, appending `marker` when anything was cut
pub(crate) fn truncate_chars(text: &str, max: usize, marker: &str) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{}", &text[..cut], marker),
        None => text.to_string(),
    }
}

/// Size in kilobytes with one decimal
pub(crate) fn kb(bytes: u64) -> String {
    format!("{:.1}KB", bytes as f64 / 1024.0)
}

/// Prepare parameters for a tool from literal pairs
#[cfg(test)]
pub(crate) fn params_for(tool: &dyn crate::tools::Tool, pairs: &[(&str, &str)]) -> crate::tools::ToolParams {
    let raw: indexmap::IndexMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    crate::tools::ToolParams::prepare(&tool.descriptor(), &raw).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10, "..."), "hello");
        assert_eq!(truncate_chars("hello", 5, "..."), "hello");
        assert_eq!(truncate_chars("hello", 3, "..."), "hel...");
        // Multi-byte characters are never split
        assert_eq!(truncate_chars("añoñaño", 2, "|"), "añ|");
    }

    #[test]
    fn test_kb() {
        assert_eq!(kb(0), "0.0KB");
        assert_eq!(kb(1536), "1.5KB");
    }
}

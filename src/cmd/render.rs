/*!
render.rs

Terminal rendering of display blocks. Purely presentational:
  - headers sit between banner lines of block characters
  - file blocks get a rule + 📄 caption with the repo prefix
  - errors get a ❌ prefix
  - text / info print verbatim

Returns nothing; prints straight to stdout. Formatting logic that decides
WHAT to show lives in `format.rs`.
*/

use super::format::DisplayBlock;

const FRAME_WIDTH: usize = 70;

/// Print display blocks in order with fixed visual framing.
pub fn render(blocks: &[DisplayBlock]) {
    for block in blocks {
        match block {
            DisplayBlock::Header(content) => {
                let banner = "█".repeat(FRAME_WIDTH);
                println!("\n{banner}");
                println!("  {content}");
                println!("{banner}");
            }
            DisplayBlock::File {
                repo,
                file_path,
                content,
            } => {
                // A short positional payload leaves path/content empty;
                // such items render nothing.
                if file_path.is_empty() || content.is_empty() {
                    continue;
                }
                let prefix = if repo.is_empty() {
                    String::new()
                } else {
                    format!("{repo}/")
                };
                let rule = "─".repeat(FRAME_WIDTH);
                println!("\n{rule}");
                println!("📄 {prefix}{file_path}");
                println!("{rule}");
                println!("{content}");
            }
            DisplayBlock::Text(content) | DisplayBlock::Info(content) => {
                println!("{content}");
            }
            DisplayBlock::Error(content) => {
                println!("\n❌ {content}");
            }
        }
    }
}

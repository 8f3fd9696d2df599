/*!
Command execution modules.

Layout:
  src/cmd/
    mod.rs     (this file: declarations + re-exports)
    query.rs   (MCP tool commands over the SSE session)
    share.rs   (view_share: plain REST fetch + render)
    format.rs  (response-type dispatch table -> display blocks)
    render.rs  (display blocks -> terminal)

Conventions:
  - Each command module exposes one public `execute_*` function returning
    `anyhow::Result<()>`; main maps Err to exit code 1.
  - `format.rs` never prints; `render.rs` never decides.
*/

pub mod format;
pub mod query;
pub mod render;
pub mod share;

pub use query::execute_query;
pub use share::execute_share;

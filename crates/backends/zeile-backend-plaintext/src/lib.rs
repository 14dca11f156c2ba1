//! Plain-text trace backend.
//!
//! The trace is meant for diffing and auditing converted stories. Every
//! text and asset path is listed once in an indexed table, and the code
//! refers to them by index:
//!
//! ```text
//! .text
//! t0: Good morning!;
//! t1: Kasumi;
//!
//! .path
//! p0: jp/live2d/chara/001_casual;
//!
//! .code
//! mds    #1, p0, {#5, #0.0}
//! tlk    t0, [#1], [t1]
//! ```
//!
//! | Opcode | Action | Opcode | Action |
//! |---|---|---|---|
//! | `tlk` | talk | `wch` | hideWhiteCover |
//! | `tlp` | telop | `ssc` | shakeScreen |
//! | `mds` | showModel | `sdb` | shakeDialogBox |
//! | `mdh` | hideModel | `cbg` | changeBackground |
//! | `mdm` | moveModel | `cbm` | changeBGM |
//! | `act` | act | `cse` | changeSE |
//! | `exp` | express | `blk` | blocking |
//! | `hsk` | horizontalShake | `slp` | delay |
//! | `vsk` | verticalShake | `tsk` | forkTask |
//! | `bcs` | showBlackCover | `wfa` | waitForAll |
//! | `bch` | hideBlackCover | `wft` | waitForTap |
//! | `wcs` | showWhiteCover | | |
//!
//! Numbers start with `#`. Positions are `{#<base>, #<offset>}` where the
//! base is the anchor's numeric value. Literals end with `;`, and a `;`
//! inside a literal is escaped as `\;`.

mod emit;
mod read;

use tracing::debug;
use zeile_core::error::CoreError;
use zeile_core::ir::Story;
use zeile_core::pipeline::Backend;

pub use emit::emit;
pub use read::{read, ReadError};

/// Backend writing the plain-text trace.
pub struct PlainTextBackend;

impl Backend for PlainTextBackend {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn file_extension(&self) -> &str {
        "txt"
    }

    fn emit(&self, story: &Story) -> Result<String, CoreError> {
        let out = emit(story)?;
        debug!(bytes = out.len(), "emitted plain-text trace");
        Ok(out)
    }
}

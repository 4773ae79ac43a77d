// SPDX-License-Identifier: GPL-3.0-only

use std::future::Future;

/// Drive `future` to completion on a single-threaded runtime.
///
/// Only the UDisks2 calls are async; the rest of the build is plain blocking
/// code, so a runtime is created for each of those calls and dropped after.
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(future))
}

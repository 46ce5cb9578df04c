/*! Integration tests for Armory.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - backend: Schema setup and on-disk persistence
 * - catalog: Item tables, armor sets, the membership index and the global version
 * - relation: The API-facing relation operations (add, remove, check, list)
 * - sync: Set/component synchronization and its recursion guard
 * - user: Registration, login, tokens, verification and password flows
 * - loadout: User-built loadouts, visibility, likes and favorites
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("armory=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod backend;
mod catalog;
mod helpers;
mod loadout;
mod relation;
mod sync;
mod user;

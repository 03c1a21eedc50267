/*! Integration tests for Tokenscope.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - introspect: GraphIntrospector against a mock provider served by axum
 * - batch: the batch pipeline over files and in-memory sources
 * - validator: the Validator facade end to end
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tokenscope=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod batch;
mod helpers;

use anyhow::Context as _;

fn main() -> anyhow::Result<()> {
    postcomposer::run().context("postcomposer failed")
}

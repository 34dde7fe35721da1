use std::future::Future;
use tokio::task::LocalSet;

pub(crate) fn block_on_current_thread<F, O>(f: F) -> std::io::Result<O>
where
    F: Future<Output = O>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    Ok(LocalSet::new().block_on(&runtime, f))
}

use anyhow::Context;
use raycomp_rg::RenderGraph;

use crate::frame::FrameContext;

/// Insertion points in the host's per-frame pass sequence, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RenderPassEvent {
    BeforeRendering,
    BeforeGbuffer,
    AfterGbuffer,
    BeforePostProcessing,
    AfterPostProcessing,
    AfterRendering,
}

/// A unit of frame work the host calls back into once per frame.
///
/// `record` declares the hook's resource accesses into the graph and registers the
/// closures that execute once the graph has been ordered.
pub trait RenderPassHook {
    fn name(&self) -> &str;
    fn insertion_point(&self) -> RenderPassEvent;
    fn record(&mut self, rg: &mut RenderGraph, frame: &mut FrameContext) -> anyhow::Result<()>;
}

/// Records every hook in insertion point order. Hooks sharing an insertion point
/// keep their relative order.
pub fn record_hooks(
    hooks: &mut [Box<dyn RenderPassHook>],
    rg: &mut RenderGraph,
    frame: &mut FrameContext,
) -> anyhow::Result<()> {
    puffin::profile_function!();

    hooks.sort_by_key(|hook| hook.insertion_point());

    for hook in hooks.iter_mut() {
        hook.record(rg, frame)
            .with_context(|| format!("Recording {:?}", hook.name()))?;
    }

    Ok(())
}

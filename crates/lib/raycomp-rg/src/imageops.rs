use crate::{self as rg, RenderGraph};
use raycomp_backend::{access::AccessType, image::Image};

/// Full-surface copy of `src` into `dst`. Both images must have the same 2d extent.
pub fn copy_image(rg: &mut RenderGraph, src: &rg::Handle<Image>, dst: &mut rg::Handle<Image>) {
    copy_image_named(rg, "copy image", src, dst)
}

pub fn copy_image_named(
    rg: &mut RenderGraph,
    pass_name: &str,
    src: &rg::Handle<Image>,
    dst: &mut rg::Handle<Image>,
) {
    let mut pass = rg.add_pass(pass_name);
    let src_ref = pass.read(src, AccessType::TransferRead);
    let dst_ref = pass.write(dst, AccessType::TransferWrite);

    pass.render(move |api| {
        let src = api.resources.image(src_ref)?;
        let dst = api.resources.image(dst_ref)?;

        api.device().copy_image(src, dst)
    });
}

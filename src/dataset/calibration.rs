// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parse camera calibration files of the gait dataset.
//!
//! ```xml
//! <Camera>
//!   <Geometry ncx="..." nfx="..." dx="..." dy="..." dpx="..." dpy="..."/>
//!   <Intrinsic focal="..." kappa1="..." cx="..." cy="..." sx="..."/>
//!   <Extrinsic tx="..." ty="..." tz="..." rx="..." ry="..." rz="..."/>
//! </Camera>
//! ```

use std::path::Path;

use crate::core::camera::Camera;
use crate::error::{Error, Result};
use crate::misc::type_aliases::Float;

/// Read and parse a calibration file.
pub fn read<P: AsRef<Path>>(file_path: P) -> Result<Camera> {
    let file_path = file_path.as_ref();
    let content = std::fs::read_to_string(file_path)?;
    let camera = parse(&content)?;
    log::info!("Loaded calibration {}", file_path.display());
    Ok(camera)
}

/// Parse the content of a calibration file.
pub fn parse(content: &str) -> Result<Camera> {
    let document = roxmltree::Document::parse(content)?;
    let intrinsic = Element::find(&document, "Intrinsic")?;
    let geometry = Element::find(&document, "Geometry")?;
    let extrinsic = Element::find(&document, "Extrinsic")?;
    Ok(Camera {
        cx: intrinsic.float("cx")?,
        cy: intrinsic.float("cy")?,
        focal: intrinsic.float("focal")?,
        kappa1: intrinsic.float("kappa1")?,
        sx: intrinsic.float("sx")?,
        ncx: geometry.float("ncx")?,
        nfx: geometry.float("nfx")?,
        dx: geometry.float("dx")?,
        dy: geometry.float("dy")?,
        dpx: geometry.float("dpx")?,
        dpy: geometry.float("dpy")?,
        tx: extrinsic.float("tx")?,
        ty: extrinsic.float("ty")?,
        tz: extrinsic.float("tz")?,
        rx: extrinsic.float("rx")?,
        ry: extrinsic.float("ry")?,
        rz: extrinsic.float("rz")?,
    })
}

/// A calibration element with its name, for error reporting.
struct Element<'a, 'input> {
    name: &'static str,
    node: roxmltree::Node<'a, 'input>,
}

impl<'a, 'input> Element<'a, 'input> {
    fn find(document: &'a roxmltree::Document<'input>, name: &'static str) -> Result<Self> {
        document
            .descendants()
            .find(|n| n.has_tag_name(name))
            .map(|node| Element { name, node })
            .ok_or(Error::MissingElement(name))
    }

    fn float(&self, attribute: &'static str) -> Result<Float> {
        let value = self.node.attribute(attribute).ok_or(Error::MissingAttribute {
            element: self.name,
            attribute,
        })?;
        value.trim().parse().map_err(|_| Error::InvalidAttribute {
            element: self.name,
            attribute,
            value: value.to_string(),
        })
    }
}

// TESTS #############################################################

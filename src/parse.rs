use std::path::Path;
use tracing::{debug, instrument, warn};

use crate::animation::SkeletalMotion;
use crate::errors::ImportError;
use crate::hierarchy::parse_hierarchy;
use crate::motion::parse_motion;
use crate::tokens::{tokenize, Tokens};

/// Deepest joint nesting accepted by default.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Where an `End Site` takes its offset from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndSiteOffset {
    /// The `OFFSET` written inside the `End Site` block.
    #[default]
    Declared,
    /// The enclosing joint's own `OFFSET`, as older importers did.
    /// Only useful to reproduce poses computed by such importers.
    Parent,
}

/// Knobs for [load_bvh_from_file_with_options] and friends.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub end_site_offset: EndSiteOffset,
    /// Divide each skeleton's offsets and root trajectory by the longest offset in that skeleton.
    pub normalize_offsets: bool,
    /// Files nesting joints deeper than this are rejected.
    pub max_depth: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            end_site_offset: EndSiteOffset::Declared,
            normalize_offsets: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ImportOptions {
    pub fn with_end_site_offset(mut self, end_site_offset: EndSiteOffset) -> Self {
        self.end_site_offset = end_site_offset;
        self
    }

    pub fn with_normalized_offsets(mut self, normalize_offsets: bool) -> Self {
        self.normalize_offsets = normalize_offsets;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////

fn __import(name: String, contents: &[u8], options: &ImportOptions) -> Result<SkeletalMotion, ImportError> {
    let raw = tokenize(contents);
    if raw.is_empty() {
        return Err(ImportError::Empty);
    }
    let tokens = Tokens::new(&raw);

    let mut hierarchy = parse_hierarchy(&tokens, options)?;

    // normalize before reading frames so stored transforms carry the normalized offsets
    let mut root_scales = vec![1.0; hierarchy.roots.len()];
    if options.normalize_offsets {
        for (root, scale) in hierarchy.roots.iter_mut().zip(root_scales.iter_mut()) {
            let longest = root.max_offset_length();
            if longest > 0.0 {
                root.normalize_offsets(longest);
                *scale = longest;
            } else {
                warn!(root = root.name(), "all offsets are zero, skipping normalization");
            }
        }
    }

    let motion = parse_motion(
        &tokens,
        hierarchy.motion_token,
        &hierarchy.roots,
        &root_scales,
        &hierarchy.channel_orderings,
        hierarchy.joint_count,
    )?;

    let motion = SkeletalMotion::new(
        name,
        motion.root_trajectories,
        motion.joint_transforms,
        hierarchy.channel_orderings,
        hierarchy.roots,
        motion.frame_time,
        motion.frame_count,
    );
    debug!("Loaded the following skeleton:\n{}", motion.hierarchy_dump());
    Ok(motion)
}

fn __log_failure(result: Result<SkeletalMotion, ImportError>) -> Result<SkeletalMotion, ImportError> {
    if let Err(error) = &result {
        warn!(%error, "invalid bvh file");
    }
    result
}

//////////////////////////////////////////////////////////////// PUBLIC ///////////////////////////////////////////////////////////////////////////////////////////////

/// load a bvh file from a file path
pub fn load_bvh_from_file(file_path: impl AsRef<Path>) -> Result<SkeletalMotion, ImportError> {
    load_bvh_from_file_with_options(file_path, &ImportOptions::default())
}

#[instrument(skip_all, fields(path = %file_path.as_ref().display()))]
pub fn load_bvh_from_file_with_options(
    file_path: impl AsRef<Path>,
    options: &ImportOptions,
) -> Result<SkeletalMotion, ImportError> {
    let path = file_path.as_ref();
    let contents = std::fs::read(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    });
    let result = contents.and_then(|contents| __import(path.display().to_string(), &contents, options));
    __log_failure(result)
}

/// load a bvh file from a string. The resulting motion has an empty name.
pub fn load_bvh_from_string(bvh_string: &str) -> Result<SkeletalMotion, ImportError> {
    load_bvh_from_bytes("", bvh_string.as_bytes(), &ImportOptions::default())
}

/// load bvh file contents that were already read into memory
#[instrument(skip(bvh_bytes, options))]
pub fn load_bvh_from_bytes(
    name: &str,
    bvh_bytes: &[u8],
    options: &ImportOptions,
) -> Result<SkeletalMotion, ImportError> {
    __log_failure(__import(name.to_string(), bvh_bytes, options))
}

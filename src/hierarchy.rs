use std::collections::HashMap;
use tracing::trace;

use crate::errors::ImportError;
use crate::parse::{EndSiteOffset, ImportOptions};
use crate::skeleton::SkeletonJoint;
use crate::tokens::Tokens;
use crate::types::*;

const HIERARCHY_KEYWORD: &str = "HIERARCHY";
const ROOT_KEYWORD: &str = "ROOT";
const JOINT_KEYWORD: &str = "JOINT";
const END_KEYWORD: &str = "End";
const SITE_KEYWORD: &str = "Site";
const OFFSET_KEYWORD: &str = "OFFSET";
const CHANNELS_KEYWORD: &str = "CHANNELS";
const OPEN_BRACE: &str = "{";
const CLOSE_BRACE: &str = "}";
pub(crate) const MOTION_KEYWORD: &str = "MOTION";

/// Suffix of the synthesized End Site joint names (`<parent>_end`).
pub const END_SITE_SUFFIX: &str = "_end";

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Result of parsing the `HIERARCHY` block.
#[derive(Debug)]
pub(crate) struct Hierarchy {
    pub roots: Vec<SkeletonJoint>,
    /// Channel layout of every animated joint, keyed by joint index.
    pub channel_orderings: HashMap<Index, ChannelOrdering>,
    pub joint_count: usize,
    /// Index of the `MOTION` keyword.
    pub motion_token: Index,
}

struct HierarchyParser<'t, 'o> {
    tokens: &'t Tokens<'t>,
    options: &'o ImportOptions,
    channel_orderings: HashMap<Index, ChannelOrdering>,
    next_index: Index,
}

/// Parse every `ROOT` between `HIERARCHY` and `MOTION`.
pub(crate) fn parse_hierarchy(tokens: &Tokens, options: &ImportOptions) -> Result<Hierarchy, ImportError> {
    tokens.expect(0, HIERARCHY_KEYWORD)?;

    let mut parser = HierarchyParser {
        tokens,
        options,
        channel_orderings: HashMap::new(),
        next_index: 0,
    };

    let mut roots = Vec::new();
    let mut current = 1;
    loop {
        match tokens.get(current, "ROOT or MOTION")? {
            ROOT_KEYWORD => {
                let (root, end) = parser.parse_joint(current, 0, true)?;
                roots.push(root);
                current = end + 1;
            }
            MOTION_KEYWORD => break,
            found => {
                return Err(ImportError::UnexpectedToken {
                    index: current,
                    expected: "ROOT or MOTION",
                    found: found.to_string(),
                })
            }
        }
    }

    if roots.is_empty() {
        return Err(ImportError::MissingRoot);
    }

    Ok(Hierarchy {
        roots,
        channel_orderings: parser.channel_orderings,
        joint_count: parser.next_index,
        motion_token: current,
    })
}

impl<'t, 'o> HierarchyParser<'t, 'o> {
    fn reserve_index(&mut self) -> Index {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    /// Parse one `ROOT`/`JOINT` production whose keyword sits at `start`.
    /// Returns the subtree and the index of its closing brace.
    fn parse_joint(&mut self, start: Index, depth: Depth, is_root: bool) -> Result<(SkeletonJoint, Index), ImportError> {
        if depth > self.options.max_depth {
            return Err(ImportError::TooDeep {
                max_depth: self.options.max_depth,
            });
        }
        let tokens = self.tokens;

        let name = tokens.get(start + 1, "a joint name")?.to_string();
        tokens.expect(start + 2, OPEN_BRACE)?;
        tokens.expect(start + 3, OFFSET_KEYWORD)?;
        let offset = tokens.vector(start + 4)?;
        tokens.expect(start + 7, CHANNELS_KEYWORD)?;

        let count = tokens.get(start + 8, "a channel count")?;
        let channel_count = match count {
            "3" => 3,
            "6" => 6,
            _ => {
                return Err(ImportError::InvalidChannelCount {
                    joint: name,
                    count: count.to_string(),
                })
            }
        };
        let mut channels = Vec::with_capacity(channel_count);
        for i in 0..channel_count {
            let token = tokens.get(start + 9 + i, "a channel name")?;
            let channel = token.parse::<Channel>().map_err(|_| ImportError::UnknownChannel {
                joint: name.clone(),
                channel: token.to_string(),
            })?;
            channels.push(channel);
        }
        let ordering = __channel_ordering(&name, &channels, is_root)?;

        let index = self.reserve_index();
        self.channel_orderings.insert(index, ordering);
        trace!(%name, index, depth, ?ordering, "joint");

        let mut children = Vec::new();
        let mut current = start + 9 + channel_count;
        loop {
            match tokens.get(current, "JOINT, End Site or }")? {
                // channels of a childless joint would have nothing to animate
                CLOSE_BRACE if children.is_empty() => {
                    return Err(ImportError::UnexpectedToken {
                        index: current,
                        expected: "JOINT or End Site",
                        found: CLOSE_BRACE.to_string(),
                    })
                }
                CLOSE_BRACE => break,
                JOINT_KEYWORD => {
                    let (child, end) = self.parse_joint(current, depth + 1, false)?;
                    children.push(child);
                    current = end + 1;
                }
                END_KEYWORD => {
                    tokens.expect(current + 1, SITE_KEYWORD)?;
                    tokens.expect(current + 2, OPEN_BRACE)?;
                    tokens.expect(current + 3, OFFSET_KEYWORD)?;
                    let declared = tokens.vector(current + 4)?;
                    tokens.expect(current + 7, CLOSE_BRACE)?;

                    let end_offset = match self.options.end_site_offset {
                        EndSiteOffset::Declared => declared,
                        EndSiteOffset::Parent => offset,
                    };
                    let end_index = self.reserve_index();
                    children.push(SkeletonJoint::new(
                        format!("{name}{END_SITE_SUFFIX}"),
                        end_index,
                        end_offset,
                        Vec::new(),
                    ));
                    current += 8;
                }
                found => {
                    return Err(ImportError::UnexpectedToken {
                        index: current,
                        expected: "JOINT, End Site or }",
                        found: found.to_string(),
                    })
                }
            }
        }

        Ok((SkeletonJoint::new(name, index, offset, children), current))
    }
}

/// Roots carry three positions then three rotations, other joints three rotations.
fn __channel_ordering(joint: &str, channels: &[Channel], is_root: bool) -> Result<ChannelOrdering, ImportError> {
    let layout_error = |reason| ImportError::InvalidChannelLayout {
        joint: joint.to_string(),
        reason,
    };
    let axes = |channels: &[Channel], kind: ChannelKind| -> Option<[Axis; 3]> {
        match channels {
            [a, b, c] if [a, b, c].iter().all(|channel| channel.kind == kind) => Some([a.axis, b.axis, c.axis]),
            _ => None,
        }
    };

    match (is_root, channels.len()) {
        (true, 6) => {
            let position = axes(&channels[..3], ChannelKind::Position)
                .ok_or_else(|| layout_error("a root must start with three position channels"))?;
            let rotation = axes(&channels[3..], ChannelKind::Rotation)
                .ok_or_else(|| layout_error("a root must end with three rotation channels"))?;
            Ok(ChannelOrdering {
                position: Some(position),
                rotation,
            })
        }
        (true, _) => Err(layout_error("a root must declare 6 channels")),
        (false, 3) => {
            let rotation = axes(channels, ChannelKind::Rotation)
                .ok_or_else(|| layout_error("a joint must declare three rotation channels"))?;
            Ok(ChannelOrdering {
                position: None,
                rotation,
            })
        }
        (false, _) => Err(layout_error("only a root may declare 6 channels")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::tokenize;

    fn parse(text: &str, options: &ImportOptions) -> Result<Hierarchy, ImportError> {
        let raw = tokenize(text.as_bytes());
        let tokens = Tokens::new(&raw);
        parse_hierarchy(&tokens, options)
    }

    const ARM: &str = "
        HIERARCHY
        ROOT Hips
        {
            OFFSET 0 0 0
            CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
            JOINT Spine
            {
                OFFSET 0 5 0
                CHANNELS 3 Zrotation Xrotation Yrotation
                End Site
                {
                    OFFSET 0 4 0
                }
            }
            JOINT LeftUpLeg
            {
                OFFSET 2 -1 0
                CHANNELS 3 Yrotation Xrotation Zrotation
                JOINT LeftLeg
                {
                    OFFSET 0 -6 0
                    CHANNELS 3 Xrotation Yrotation Zrotation
                    End Site
                    {
                        OFFSET 0 -7 1
                    }
                }
            }
        }
        MOTION
    ";

    #[test_log::test]
    fn builds_tree_and_orderings() {
        let hierarchy = parse(ARM, &ImportOptions::default()).unwrap();
        assert_eq!(hierarchy.roots.len(), 1);
        assert_eq!(hierarchy.joint_count, 6);

        let root = &hierarchy.roots[0];
        let names: Vec<&str> = root.iter().map(|joint| joint.name()).collect();
        assert_eq!(
            names,
            vec!["Hips", "Spine", "Spine_end", "LeftUpLeg", "LeftLeg", "LeftLeg_end"]
        );
        let indices: Vec<Index> = root.iter().map(|joint| joint.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        // 4 ROOT/JOINT keywords, 2 End Sites, 1 root
        assert_eq!(root.iter().filter(|joint| !joint.is_leaf()).count(), 4);
        assert_eq!(root.iter().filter(|joint| joint.is_leaf()).count(), 2);
        assert_eq!(root.bones_by_joint_names().len(), (4 - 1) + 2);

        // End Sites are never animated
        assert_eq!(hierarchy.channel_orderings.len(), 4);
        assert!(!hierarchy.channel_orderings.contains_key(&2));
        assert!(!hierarchy.channel_orderings.contains_key(&5));

        assert_eq!(hierarchy.channel_orderings[&0].axis_indices(), vec![0, 1, 2, 2, 0, 1]);
        assert_eq!(hierarchy.channel_orderings[&3].axis_indices(), vec![1, 0, 2]);
        assert_eq!(
            hierarchy.channel_orderings[&4].rotation,
            [Axis::X, Axis::Y, Axis::Z]
        );

        let raw = tokenize(ARM.as_bytes());
        assert_eq!(raw[hierarchy.motion_token], "MOTION");
    }

    #[test]
    fn end_site_reads_its_own_offset() {
        let hierarchy = parse(ARM, &ImportOptions::default()).unwrap();
        let end = hierarchy.roots[0].find_joint_by_name("LeftLeg_end").unwrap();
        assert_eq!(end.local_offset(), Position::new(0.0, -7.0, 1.0));
    }

    #[test]
    fn end_site_can_copy_parent_offset() {
        let options = ImportOptions::default().with_end_site_offset(EndSiteOffset::Parent);
        let hierarchy = parse(ARM, &options).unwrap();
        let end = hierarchy.roots[0].find_joint_by_name("LeftLeg_end").unwrap();
        assert_eq!(end.local_offset(), Position::new(0.0, -6.0, 0.0));
        let end = hierarchy.roots[0].find_joint_by_name("Spine_end").unwrap();
        assert_eq!(end.local_offset(), Position::new(0.0, 5.0, 0.0));
    }

    #[test]
    fn several_roots() {
        let text = "
            HIERARCHY
            ROOT A { OFFSET 0 0 0 CHANNELS 6 Xposition Yposition Zposition Xrotation Yrotation Zrotation
                End Site { OFFSET 1 0 0 } }
            ROOT B { OFFSET 0 0 0 CHANNELS 6 Zposition Xposition Yposition Xrotation Yrotation Zrotation
                End Site { OFFSET 0 1 0 } }
            MOTION";
        let hierarchy = parse(text, &ImportOptions::default()).unwrap();
        assert_eq!(hierarchy.roots.len(), 2);
        assert_eq!(hierarchy.roots[1].index(), 2);
        assert_eq!(hierarchy.channel_orderings[&2].position, Some([Axis::Z, Axis::X, Axis::Y]));
    }

    #[test]
    fn missing_offset_and_channels() {
        let result = parse("HIERARCHY ROOT Hips } MOTION", &ImportOptions::default());
        assert!(matches!(
            result,
            Err(ImportError::UnexpectedToken { index: 3, expected: "{", .. })
        ));
    }

    #[test]
    fn invalid_channel_count() {
        let text = "HIERARCHY ROOT Hips { OFFSET 0 0 0 CHANNELS 4 Xposition Yposition Zposition Zrotation }";
        assert!(matches!(
            parse(text, &ImportOptions::default()),
            Err(ImportError::InvalidChannelCount { .. })
        ));
    }

    #[test]
    fn invalid_channel_layouts() {
        let three_channel_root = "HIERARCHY ROOT Hips { OFFSET 0 0 0 CHANNELS 3 Zrotation Xrotation Yrotation }";
        assert!(matches!(
            parse(three_channel_root, &ImportOptions::default()),
            Err(ImportError::InvalidChannelLayout { .. })
        ));

        let rotations_first = "HIERARCHY ROOT Hips { OFFSET 0 0 0
            CHANNELS 6 Zrotation Xrotation Yrotation Xposition Yposition Zposition }";
        assert!(matches!(
            parse(rotations_first, &ImportOptions::default()),
            Err(ImportError::InvalidChannelLayout { .. })
        ));

        let unknown = "HIERARCHY ROOT Hips { OFFSET 0 0 0
            CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Wrotation }";
        assert!(matches!(
            parse(unknown, &ImportOptions::default()),
            Err(ImportError::UnknownChannel { .. })
        ));
    }

    #[test]
    fn structural_mismatches() {
        let options = ImportOptions::default();
        assert!(matches!(
            parse("ROOT Hips", &options),
            Err(ImportError::UnexpectedToken { index: 0, .. })
        ));
        assert!(matches!(parse("HIERARCHY MOTION", &options), Err(ImportError::MissingRoot)));
        assert!(matches!(
            parse("HIERARCHY JOINT Hips", &options),
            Err(ImportError::UnexpectedToken { index: 1, .. })
        ));

        let bad_end_site = "HIERARCHY ROOT Hips { OFFSET 0 0 0
            CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
            End Site { OFFSET 0 1 0 0 } } MOTION";
        assert!(matches!(
            parse(bad_end_site, &options),
            Err(ImportError::UnexpectedToken { expected: "}", .. })
        ));

        let childless = "HIERARCHY ROOT Hips { OFFSET 0 0 0
            CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation } MOTION";
        assert!(matches!(
            parse(childless, &options),
            Err(ImportError::UnexpectedToken { expected: "JOINT or End Site", .. })
        ));

        let stray_token = "HIERARCHY ROOT Hips { OFFSET 0 0 0
            CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
            Bogus } MOTION";
        assert!(matches!(
            parse(stray_token, &options),
            Err(ImportError::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn truncated_input_fails_cleanly() {
        let options = ImportOptions::default();
        let full = ARM.split_whitespace().collect::<Vec<_>>();
        for len in 0..full.len() - 1 {
            let text = full[..len].join(" ");
            assert!(parse(&text, &options).is_err(), "prefix of {len} tokens parsed");
        }
    }

    #[test]
    fn depth_limit() {
        let options = ImportOptions::default().with_max_depth(1);
        assert!(matches!(parse(ARM, &options), Err(ImportError::TooDeep { max_depth: 1 })));

        let options = ImportOptions::default().with_max_depth(2);
        assert!(parse(ARM, &options).is_ok());
    }
}

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command, value_parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

use crate::{
    enumeration::{
        ban_constraint::{BanConstraint, BanNone},
        lp_constraint::{LPConstraint, LPConstraintEulerPositive, LPConstraintNone},
        tree_enumeration::TreeEnumeration,
        tree_single_solution::TreeSingleSolution,
    },
    surfaces::normal_coordinates::NormalCoordinates,
    triangulation::triangulation::Triangulation,
};

pub const TREE_COMMAND: TreeCommand = TreeCommand {
    name: "normal-tree",
    explanation_short: "Enumerates vertex normal surfaces of a 3-manifold triangulation using a tree traversal.",
    explanation_long: Some(
        "Enumerates vertex normal or almost normal surfaces of the triangulation with the given isomorphism signature, or searches for a single surface of positive Euler characteristic. Exactly one mode must be given.",
    ),
    modes: &[
        &TreeMode::Enumerate {
            name_short: 'q',
            name_long: "quad",
            explanation_short: "Enumerate vertex surfaces in quadrilateral coordinates.",
            coords: NormalCoordinates::Quad,
        },
        &TreeMode::Enumerate {
            name_short: 's',
            name_long: "standard",
            explanation_short: "Enumerate vertex surfaces in standard coordinates.",
            coords: NormalCoordinates::Standard,
        },
        &TreeMode::Enumerate {
            name_short: 'a',
            name_long: "almost-normal",
            explanation_short: "Enumerate vertex surfaces in standard almost normal coordinates.",
            coords: NormalCoordinates::AlmostNormal,
        },
        &TreeMode::Enumerate {
            name_short: 'o',
            name_long: "quad-oct",
            explanation_short: "Enumerate vertex surfaces in quadrilateral-octagon coordinates.",
            coords: NormalCoordinates::AlmostNormalQuadOct,
        },
        &TreeMode::SingleSolution {
            name_short: 'e',
            name_long: "euler",
            explanation_short: "Search for a single normal surface of positive Euler characteristic.",
            coords: NormalCoordinates::Standard,
        },
        &TreeMode::SingleSolution {
            name_short: '3',
            name_long: "sphere",
            explanation_short: "Search for a single almost normal surface of positive Euler characteristic.",
            coords: NormalCoordinates::AlmostNormal,
        },
    ],
};

pub const ARG_ID_SIGNATURE: &str = "signature";
pub const ARG_ID_MODE: &str = "mode";
pub const ARG_SHORT_TYPES: char = 't';
pub const ARG_ID_TYPES: &str = "types";
pub const ARG_SHORT_PROGRESS: char = 'p';
pub const ARG_ID_PROGRESS: &str = "progress";
pub const ARG_SHORT_VERBOSE: char = 'v';
pub const ARG_ID_VERBOSE: &str = "verbose";

pub struct TreeCommand {
    pub name: &'static str,
    pub explanation_short: &'static str,
    pub explanation_long: Option<&'static str>,
    pub modes: &'static [&'static TreeMode],
}

pub enum TreeMode {
    Enumerate {
        name_short: char,
        name_long: &'static str,
        explanation_short: &'static str,
        coords: NormalCoordinates,
    },
    SingleSolution {
        name_short: char,
        name_long: &'static str,
        explanation_short: &'static str,
        coords: NormalCoordinates,
    },
}

/**
 * What a run of the command found: the number of solutions and the number
 * of nodes of the search tree that were visited.
 */
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeOutcome {
    pub solutions: usize,
    pub visited: usize,
}

impl TreeCommand {
    pub fn build_cli(&self) -> Command {
        let mut command = Command::new(self.name).about(self.explanation_short);
        if let Some(l) = self.explanation_long {
            command = command.long_about(l);
        }

        command = command.arg(
            Arg::new(ARG_ID_SIGNATURE)
                .action(ArgAction::Set)
                .value_name("SIGNATURE")
                .help("The isomorphism signature of the triangulation.")
                .required(true)
                .value_parser(value_parser!(String)),
        );

        for mode in self.modes.iter() {
            command = command.arg(
                Arg::new(mode.long_name())
                    .short(mode.short_name())
                    .long(mode.long_name())
                    .action(ArgAction::SetTrue)
                    .help(mode.explanation_short()),
            );
        }
        command = command.group(
            ArgGroup::new(ARG_ID_MODE)
                .args(self.modes.iter().map(|mode| mode.long_name()))
                .required(true)
                .multiple(false),
        );

        command
            .arg(
                Arg::new(ARG_ID_TYPES)
                    .short(ARG_SHORT_TYPES)
                    .long(ARG_ID_TYPES)
                    .action(ArgAction::SetTrue)
                    .help("Print type vectors instead of surface vectors."),
            )
            .arg(
                Arg::new(ARG_ID_PROGRESS)
                    .short(ARG_SHORT_PROGRESS)
                    .long(ARG_ID_PROGRESS)
                    .action(ArgAction::SetTrue)
                    .help("Show the progress of the search."),
            )
            .arg(
                Arg::new(ARG_ID_VERBOSE)
                    .short(ARG_SHORT_VERBOSE)
                    .long(ARG_ID_VERBOSE)
                    .action(ArgAction::Count)
                    .help("Log more; may be repeated."),
            )
    }

    /**
     * The log level asked for by the number of -v flags, if any was given.
     */
    pub fn log_level(&self, cli_matches: &ArgMatches) -> Option<LevelFilter> {
        match cli_matches.get_count(ARG_ID_VERBOSE) {
            0 => None,
            1 => Some(LevelFilter::Warn),
            2 => Some(LevelFilter::Info),
            3 => Some(LevelFilter::Debug),
            _ => Some(LevelFilter::Trace),
        }
    }

    pub fn mode(&self, cli_matches: &ArgMatches) -> Result<&'static TreeMode> {
        self.modes
            .iter()
            .find(|mode| cli_matches.get_flag(mode.long_name()))
            .copied()
            .ok_or_else(|| anyhow!("no mode given"))
    }

    pub fn execute(&self, cli_matches: &ArgMatches) -> Result<TreeOutcome> {
        let signature = cli_matches
            .get_one::<String>(ARG_ID_SIGNATURE)
            .ok_or_else(|| anyhow!("no isomorphism signature given"))?;
        let mode = self.mode(cli_matches)?;
        let types = cli_matches.get_flag(ARG_ID_TYPES);
        let progress = cli_matches.get_flag(ARG_ID_PROGRESS);

        let triangulation = Triangulation::from_iso_sig(signature)
            .with_context(|| format!("reading isomorphism signature `{}`", signature))?;
        if triangulation.is_empty() {
            return Err(anyhow!("isomorphism signature `{}` describes an empty triangulation", signature));
        }
        log::info!(
            "{} on a triangulation with {} tetrahedra in {} coordinates",
            mode.long_name(),
            triangulation.size(),
            mode.coordinates()
        );

        mode.execute(Arc::new(triangulation), types, progress)
            .with_context(|| format!("running {} on `{}`", mode.long_name(), signature))
    }

    pub fn get_progress_bar(total_ticks: u64) -> Result<ProgressBar> {
        let pb = ProgressBar::new(total_ticks);
        pb.set_style(ProgressStyle::with_template("[{wide_bar:.cyan/blue}] {pos:>7}/{len:7}")?.progress_chars("#>-"));
        pb.set_position(0);
        Ok(pb)
    }
}

//the progress bar counts hundredths of a percent
const PROGRESS_TICKS: u64 = 10000;

impl TreeMode {
    pub fn short_name(&self) -> char {
        match self {
            TreeMode::Enumerate { name_short, .. } => *name_short,
            TreeMode::SingleSolution { name_short, .. } => *name_short,
        }
    }

    pub fn long_name(&self) -> &'static str {
        match self {
            TreeMode::Enumerate { name_long, .. } => name_long,
            TreeMode::SingleSolution { name_long, .. } => name_long,
        }
    }

    pub fn explanation_short(&self) -> &'static str {
        match self {
            TreeMode::Enumerate { explanation_short, .. } => explanation_short,
            TreeMode::SingleSolution { explanation_short, .. } => explanation_short,
        }
    }

    pub fn coordinates(&self) -> NormalCoordinates {
        match self {
            TreeMode::Enumerate { coords, .. } => *coords,
            TreeMode::SingleSolution { coords, .. } => *coords,
        }
    }

    pub fn execute(&self, triangulation: Arc<Triangulation>, types: bool, progress: bool) -> Result<TreeOutcome> {
        match self {
            TreeMode::Enumerate { coords, .. } => {
                enumerate::<LPConstraintNone, BanNone>(triangulation, *coords, types, progress)
            }
            TreeMode::SingleSolution { coords, .. } => {
                single_solution::<LPConstraintEulerPositive, BanNone>(triangulation, *coords, types, progress)
            }
        }
    }
}

fn enumerate<C: LPConstraint, B: BanConstraint>(
    triangulation: Arc<Triangulation>,
    coords: NormalCoordinates,
    types: bool,
    progress: bool,
) -> Result<TreeOutcome> {
    let mut tree = TreeEnumeration::<C, B>::new(triangulation, coords)?;
    if tree.traversal().constraints_broken() {
        log::warn!("the constraint `{}` could not be added; enumerating without it", C::NAME);
    }

    let pb = if progress {
        TreeCommand::get_progress_bar(PROGRESS_TICKS)?
    } else {
        ProgressBar::hidden()
    };

    tree.run(|tree| {
        pb.suspend(|| {
            if types {
                TreeEnumeration::write_types(tree)
            } else {
                TreeEnumeration::write_surface(tree)
            }
        });
        pb.set_position((tree.percent() * 100.0) as u64);
        false
    });
    pb.finish_and_clear();

    println!("# solutions = {}", tree.solutions());
    println!("# nodes visited = {}", tree.visited());

    Ok(TreeOutcome {
        solutions: tree.solutions(),
        visited: tree.visited(),
    })
}

fn single_solution<C: LPConstraint, B: BanConstraint>(
    triangulation: Arc<Triangulation>,
    coords: NormalCoordinates,
    types: bool,
    progress: bool,
) -> Result<TreeOutcome> {
    let mut tree = TreeSingleSolution::<C, B>::new(triangulation, coords)?;

    //a single search gives no chance to update a bar
    let pb = if progress {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };
    let found = tree.find();
    pb.finish_and_clear();

    if found {
        if types {
            println!("{}", tree.type_string());
        } else {
            println!("{}", tree.build_surface());
        }
    } else {
        println!("no non-trivial solution with {}", C::NAME);
    }
    println!("# nodes visited = {}", tree.visited());

    Ok(TreeOutcome {
        solutions: if found { 1 } else { 0 },
        visited: tree.visited(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use clap::error::ErrorKind;
    use log::LevelFilter;

    use crate::{surfaces::normal_coordinates::NormalCoordinates, triangulation::triangulation::Triangulation};

    use super::{TREE_COMMAND, TreeMode};

    #[test]
    fn cli_is_consistent() {
        TREE_COMMAND.build_cli().debug_assert();
    }

    #[test]
    fn modes() {
        let matches = TREE_COMMAND.build_cli().try_get_matches_from(["normal-tree", "-s", "bkaagb"]).unwrap();
        let mode = TREE_COMMAND.mode(&matches).unwrap();
        assert_eq!(mode.coordinates(), NormalCoordinates::Standard);
        assert!(matches!(mode, TreeMode::Enumerate { .. }));
        assert_eq!(TREE_COMMAND.log_level(&matches), None);

        let matches = TREE_COMMAND.build_cli().try_get_matches_from(["normal-tree", "-3", "-vv", "bkaagb"]).unwrap();
        let mode = TREE_COMMAND.mode(&matches).unwrap();
        assert_eq!(mode.coordinates(), NormalCoordinates::AlmostNormal);
        assert!(matches!(mode, TreeMode::SingleSolution { .. }));
        assert_eq!(TREE_COMMAND.log_level(&matches), Some(LevelFilter::Info));
    }

    #[test]
    fn exactly_one_mode() {
        let error = TREE_COMMAND.build_cli().try_get_matches_from(["normal-tree", "-q", "-s", "bkaagb"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ArgumentConflict);

        let error = TREE_COMMAND.build_cli().try_get_matches_from(["normal-tree", "bkaagb"]).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn signature_after_separator() {
        let matches = TREE_COMMAND.build_cli().try_get_matches_from(["normal-tree", "-t", "-q", "--", "cPcbbbiht"]).unwrap();
        assert_eq!(TREE_COMMAND.execute(&matches).unwrap().solutions, 4);
    }

    #[test]
    fn invalid_signature() {
        let matches = TREE_COMMAND.build_cli().try_get_matches_from(["normal-tree", "-s", "b!"]).unwrap();
        assert!(TREE_COMMAND.execute(&matches).is_err());
    }

    #[test]
    fn execute_modes() {
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagb").unwrap());
        let outcomes: Vec<usize> = TREE_COMMAND
            .modes
            .iter()
            .map(|mode| mode.execute(tri.clone(), false, false).unwrap().solutions)
            .collect();
        assert_eq!(outcomes, vec![1, 3, 4, 2, 1, 1]);
    }

    #[test]
    fn sphere_needs_octagon() {
        let tri = Arc::new(Triangulation::from_iso_sig("bkaagj").unwrap());
        let euler = TREE_COMMAND.modes.iter().find(|mode| mode.long_name() == "euler").unwrap();
        let sphere = TREE_COMMAND.modes.iter().find(|mode| mode.long_name() == "sphere").unwrap();
        assert_eq!(euler.execute(tri.clone(), false, false).unwrap().solutions, 0);
        assert_eq!(sphere.execute(tri, false, false).unwrap().solutions, 1);
    }
}

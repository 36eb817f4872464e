use bindery_decl::{CreatorDecl, UseCreator};

use crate::binder::BindConfig;
use crate::error::BuildError;

// -----------------------------------------------------------------------------
// Creator selection

/// Picks the creator a descriptor will instantiate through.
///
/// A single [`UseCreator`] marker settles the question outright. Otherwise
/// the configuration drives the choice: by default the no-argument creator
/// is preferred, and creators with parameters are only eligible once
/// `use_args_creators` is switched on. Two marked creators, or two eligible
/// parameterized ones with the no-argument preference off, are ambiguous.
pub(crate) fn select_creator(
    type_path: &'static str,
    creators: &'static [CreatorDecl],
    config: &BindConfig,
) -> Result<&'static CreatorDecl, BuildError> {
    let marked: Vec<&'static CreatorDecl> = creators
        .iter()
        .filter(|c| c.attrs().has::<UseCreator>())
        .collect();
    match marked[..] {
        [] => {}
        [chosen] => return Ok(chosen),
        _ => return Err(BuildError::AmbiguousCreator { type_path }),
    }

    let no_args = creators.iter().find(|c| c.params().is_empty());
    if config.prefer_no_args_creator && let Some(chosen) = no_args {
        return Ok(chosen);
    }

    if config.use_args_creators {
        let mut with_args = creators.iter().filter(|c| !c.params().is_empty());
        if let Some(chosen) = with_args.next() {
            if with_args.next().is_some() {
                return Err(BuildError::AmbiguousCreator { type_path });
            }
            return Ok(chosen);
        }
    }

    no_args.ok_or(BuildError::NoCreator { type_path })
}

// -----------------------------------------------------------------------------
// Tests

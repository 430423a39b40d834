//! Installation-type questions: advanced mode, development mode, debug

use super::Session;
use crate::config::ConfigDocument;
use anyhow::Result;

pub fn run(doc: &mut ConfigDocument, session: &mut Session) -> Result<()> {
    let advanced = session
        .prompter
        .confirm("Use advanced settings?", doc.get_bool("advanced"))?;
    doc.set_bool("advanced", advanced);

    if advanced {
        let dev_mode = session
            .prompter
            .confirm("Run in development mode?", doc.get_bool("dev_mode"))?;
        doc.set_bool("dev_mode", dev_mode);

        let debug = if dev_mode {
            session
                .prompter
                .confirm("Enable debug output?", doc.get_bool("debug"))?
        } else {
            false
        };
        doc.set_bool("debug", debug);
    } else {
        // Untaken branch still sets every key it owns.
        doc.set_bool("dev_mode", false);
        doc.set_bool("debug", false);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::stub::StubValidator;
    use crate::prompt::ScriptedPrompter;

    #[test]
    fn test_plain_install_clears_advanced_flags() {
        let mut doc = ConfigDocument::defaults();
        doc.set_bool("dev_mode", true);
        doc.set_bool("debug", true);

        let mut prompter = ScriptedPrompter::new(["n"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert!(!doc.get_bool("advanced"));
        assert!(!doc.get_bool("dev_mode"));
        assert!(!doc.get_bool("debug"));
    }

    #[test]
    fn test_advanced_dev_mode() {
        let mut doc = ConfigDocument::defaults();
        let mut prompter = ScriptedPrompter::new(["y", "y", "n"]);
        let validator = StubValidator::new(vec![]);
        let mut session = Session::new(&mut prompter, true, &validator);
        run(&mut doc, &mut session).unwrap();

        assert!(doc.get_bool("advanced"));
        assert!(doc.get_bool("dev_mode"));
        assert!(!doc.get_bool("debug"));
    }
}

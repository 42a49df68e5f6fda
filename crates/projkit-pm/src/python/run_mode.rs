use std::path::Path;
use tracing::{debug, info};

/// How a Python entry point should be launched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// `python file.py`
    Direct,
    /// A Streamlit dashboard: `python -m streamlit run file.py`
    Dashboard,
    /// An ASGI app (FastAPI, Starlette, Litestar): `python -m uvicorn module:app --reload`
    Asgi,
}

const DASHBOARD_MARKERS: &[&str] = &["import streamlit", "from streamlit import"];

const ASGI_MARKERS: &[&str] = &[
    "from fastapi import",
    "from fastapi.applications import",
    "import fastapi",
    "FastAPI()",
    "from starlette.applications import",
    "from starlette import",
    "import starlette",
    "Starlette()",
    "from litestar import",
    "import litestar",
    "Litestar(",
];

/// Classify Python source by plain substring matching on its imports
///
/// Dashboard markers win over ASGI ones when a file has both.
pub fn sniff_source(source: &str) -> RunMode {
    if DASHBOARD_MARKERS.iter().any(|m| source.contains(m)) {
        RunMode::Dashboard
    } else if ASGI_MARKERS.iter().any(|m| source.contains(m)) {
        RunMode::Asgi
    } else {
        RunMode::Direct
    }
}

/// Read `path` and classify it. Files are read on every call, never cached,
/// and an unreadable file runs directly.
pub fn detect_run_mode(path: &Path) -> RunMode {
    match std::fs::read_to_string(path) {
        Ok(source) => sniff_source(&source),
        Err(e) => {
            debug!("Could not read {} for run mode detection: {}", path.display(), e);
            RunMode::Direct
        }
    }
}

/// uvicorn target for a script path: `api/main.py` becomes `api.main:app`
pub fn asgi_target(script: &str) -> String {
    let script = script.strip_prefix("./").unwrap_or(script);
    let module = script.strip_suffix(".py").unwrap_or(script);
    format!("{}:app", module.replace(['/', '\\'], "."))
}

/// Arguments to hand the project's Python interpreter for `script`
///
/// `None` means the script isn't something Python should run itself (not
/// `test` and not a `.py` file), and each tool decides what to do with it.
pub(crate) fn interpreter_args(dir: &Path, script: &str, args: &[String]) -> Option<Vec<String>> {
    let mut argv: Vec<String> = if script == "test" {
        vec!["-m".into(), "pytest".into()]
    } else if script.ends_with(".py") {
        match detect_run_mode(&dir.join(script)) {
            RunMode::Dashboard => {
                info!("Detected Streamlit app, running with streamlit");
                vec!["-m".into(), "streamlit".into(), "run".into(), script.into()]
            }
            RunMode::Asgi => {
                info!("Detected ASGI app, running with uvicorn");
                vec![
                    "-m".into(),
                    "uvicorn".into(),
                    asgi_target(script),
                    "--reload".into(),
                ]
            }
            RunMode::Direct => vec![script.into()],
        }
    } else {
        return None;
    };

    argv.extend(args.iter().cloned());
    Some(argv)
}

//! Julia `Pkg` backend.
//!
//! Each operation starts `julia --project=<env>` with a short script; the
//! package names are passed as `ARGS` so they never end up inside Julia
//! source text.

use std::collections::BTreeSet;

use tracing::debug;

use crate::environment::Environment;
use crate::error::{NbenvError, Result};
use crate::shell::{execute, execute_check, CommandOptions, CommandResult};

use super::{join_names, PackageManager};

const ADD_SCRIPT: &str = "using Pkg; Pkg.add(ARGS)";

const REMOVE_SCRIPT: &str = "using Pkg; Pkg.rm(ARGS)";

const UPDATE_SCRIPT: &str = "using Pkg; Pkg.update()";

const COMPAT_SCRIPT: &str = r#"
using Pkg
deps = Pkg.dependencies()
for (name, uuid) in Pkg.project().dependencies
    Pkg.Types.is_stdlib(uuid) && continue
    info = get(deps, uuid, nothing)
    (info === nothing || info.version === nothing) && continue
    Pkg.compat(name, "~" * string(info.version))
end
"#;

/// Lines of Julia's stderr kept in error messages.
const STDERR_TAIL: usize = 20;

/// Package manager backed by the `julia` executable.
#[derive(Debug, Clone)]
pub struct JuliaPkg {
    program: String,
    extra_args: Vec<String>,
}

impl JuliaPkg {
    /// Use the given `julia` executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
        }
    }

    /// Extra arguments placed before the ones nbenv adds (e.g. `+1.10`).
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// The configured executable.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether the executable can be started.
    pub fn is_available(&self) -> bool {
        execute_check(&self.program, &["--version"], None)
    }

    /// Full argument list for running `script` in `env`.
    pub fn command_args(&self, env: &Environment, script: &str, names: &[String]) -> Vec<String> {
        let mut args = self.extra_args.clone();
        args.push("--startup-file=no".to_string());
        args.push(format!("--project={}", env.path().display()));
        args.push("-e".to_string());
        args.push(script.to_string());
        args.extend(names.iter().cloned());
        args
    }

    fn run(&self, env: &Environment, script: &str, names: &[String]) -> Result<CommandResult> {
        let mut options = CommandOptions::captured();
        options.cwd = Some(env.path().to_path_buf());
        options
            .env
            .insert("JULIA_PKG_PRECOMPILE_AUTO".to_string(), "0".to_string());

        execute(&self.program, &self.command_args(env, script, names), &options)
    }

    fn missing_from(&self, env: &Environment, names: &[String]) -> Result<Vec<String>> {
        let present = self.direct_dependencies(env)?;
        Ok(names
            .iter()
            .filter(|n| !present.contains(*n))
            .cloned()
            .collect())
    }
}

impl Default for JuliaPkg {
    fn default() -> Self {
        Self::new("julia")
    }
}

impl PackageManager for JuliaPkg {
    fn name(&self) -> &str {
        "julia"
    }

    fn ensure_available(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(NbenvError::JuliaNotFound {
                program: self.program.clone(),
            })
        }
    }

    fn direct_dependencies(&self, env: &Environment) -> Result<BTreeSet<String>> {
        Ok(env.project()?.package_names())
    }

    fn add(&self, env: &Environment, names: &[String]) -> Result<()> {
        let missing = self.missing_from(env, names)?;
        if missing.is_empty() {
            debug!("All {} package(s) already present", names.len());
            return Ok(());
        }

        let result = self.run(env, ADD_SCRIPT, &missing)?;
        if !result.success {
            return Err(NbenvError::ResolutionFailed {
                packages: join_names(&missing),
                message: result.stderr_tail(STDERR_TAIL),
            });
        }
        Ok(())
    }

    fn remove(&self, env: &Environment, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        let result = self.run(env, REMOVE_SCRIPT, names)?;
        if !result.success {
            return Err(NbenvError::PackageManagerFailed {
                operation: format!("remove {}", join_names(names)),
                message: result.stderr_tail(STDERR_TAIL),
            });
        }
        Ok(())
    }

    fn upgrade(&self, env: &Environment) -> Result<()> {
        let result = self.run(env, UPDATE_SCRIPT, &[])?;
        if !result.success {
            let packages: Vec<String> = self.direct_dependencies(env)?.into_iter().collect();
            return Err(NbenvError::ResolutionFailed {
                packages: join_names(&packages),
                message: result.stderr_tail(STDERR_TAIL),
            });
        }
        Ok(())
    }

    fn write_compat_bounds(&self, env: &Environment) -> Result<()> {
        let result = self.run(env, COMPAT_SCRIPT, &[])?;
        if !result.success {
            return Err(NbenvError::PackageManagerFailed {
                operation: "compat".to_string(),
                message: result.stderr_tail(STDERR_TAIL),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::WorkdirPolicy;

    #[test]
    fn command_args_activate_the_environment() {
        let env = Environment::materialize("", "", WorkdirPolicy::default()).unwrap();
        let pm = JuliaPkg::new("julia").with_args(vec!["+1.10".to_string()]);

        let args = pm.command_args(&env, ADD_SCRIPT, &["Plots".to_string()]);

        assert_eq!(args[0], "+1.10");
        assert_eq!(args[1], "--startup-file=no");
        assert_eq!(args[2], format!("--project={}", env.path().display()));
        assert_eq!(args[3], "-e");
        assert_eq!(args[4], ADD_SCRIPT);
        assert_eq!(args[5], "Plots");
    }

    #[test]
    fn direct_dependencies_read_project_without_julia() {
        let env = Environment::materialize(
            "[deps]\nPlots = \"91a5bcdd-55d7-5caf-9e0b-520d859cae80\"\n",
            "",
            WorkdirPolicy::default(),
        )
        .unwrap();
        let pm = JuliaPkg::new("nbenv-no-such-julia");

        let deps = pm.direct_dependencies(&env).unwrap();
        assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["Plots"]);
    }

    #[test]
    fn adding_present_packages_does_not_start_julia() {
        let env = Environment::materialize(
            "[deps]\nPlots = \"91a5bcdd-55d7-5caf-9e0b-520d859cae80\"\n",
            "",
            WorkdirPolicy::default(),
        )
        .unwrap();
        let pm = JuliaPkg::new("nbenv-no-such-julia");

        pm.add(&env, &["Plots".to_string()]).unwrap();
    }

    #[test]
    fn removing_nothing_does_not_start_julia() {
        let env = Environment::materialize("", "", WorkdirPolicy::default()).unwrap();
        let pm = JuliaPkg::new("nbenv-no-such-julia");

        pm.remove(&env, &[]).unwrap();
    }

    #[test]
    fn missing_executable_is_a_command_failure() {
        let env = Environment::materialize("", "", WorkdirPolicy::default()).unwrap();
        let pm = JuliaPkg::new("nbenv-no-such-julia");

        assert!(!pm.is_available());
        assert!(matches!(
            pm.ensure_available(),
            Err(NbenvError::JuliaNotFound { program }) if program == "nbenv-no-such-julia"
        ));
        let err = pm.add(&env, &["Plots".to_string()]).unwrap_err();
        assert!(matches!(err, NbenvError::CommandFailed { .. }));
    }
}

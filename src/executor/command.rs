//! Pure construction of the shell line executed inside a container.
//!
//! No I/O here: given a profile and a dependency list, produce the script
//! handed to `sh -c`. Kept separate so the install/run joining rules are
//! testable without a container runtime.

use tracing::warn;

use super::profile::ContainerProfile;

/// Sentinel exit code marking a failed install step.
///
/// The install clause is joined as `install ... || exit 119 && run ...`:
/// `&&` and `||` bind equally and left-associatively in sh, so a failing
/// install exits the shell with this code before the run clause, and a
/// succeeding install proceeds to it. The docker runner maps this code to
/// an install error. User code that itself exits 119 while dependencies
/// were requested is classified as an install failure; accepted ambiguity.
pub const INSTALL_FAILURE_EXIT: i32 = 119;

/// Build the script for one ephemeral container invocation.
///
/// The install clause is present only when `dependencies` is non-empty and
/// the profile carries an install template. Dependency order is preserved.
/// A profile without an install template ignores the list (logged, never
/// installed).
pub fn container_script(profile: &ContainerProfile, dependencies: &[String]) -> String {
    let run = profile.run.join(" ");

    if dependencies.is_empty() {
        return run;
    }

    let Some(install) = profile.install else {
        warn!(
            name = profile.name,
            dependencies = ?dependencies,
            "Profile has no install command, ignoring dependencies"
        );
        return run;
    };

    let mut script = install.join(" ");
    for dep in dependencies {
        script.push(' ');
        script.push_str(dep);
    }
    script.push_str(&format!(" || exit {INSTALL_FAILURE_EXIT} && {run}"));
    script
}

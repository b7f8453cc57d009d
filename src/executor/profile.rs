//! Static per-language execution profiles.
//!
//! Profiles are hardcoded configuration, constructed at startup and never
//! mutated. Each supported language has one profile per backend; the
//! per-language constructors are the registry, so a language without a
//! profile cannot be requested at all.
//!
//! [`HostProfile`] deliberately has no install-command field. Host execution
//! must never install externally-specified dependencies, and the invariant
//! is carried by the type rather than by a runtime check.

/// How a host profile delivers code to its interpreter.
#[derive(Debug, Clone, Copy)]
pub enum HostInvocation {
    /// Pipe the code to the interpreter's stdin. Avoids shell escaping and
    /// argument-length limits.
    Stdin { binary: &'static str },
    /// Write the code to `file_name` inside a scratch directory and append
    /// the path to the first candidate command found on `PATH`.
    SourceFile {
        file_name: &'static str,
        candidates: &'static [&'static [&'static str]],
    },
}

/// Descriptor for running a language directly on the host.
#[derive(Debug, Clone, Copy)]
pub struct HostProfile {
    /// Identifier used in error messages and logs.
    pub name: &'static str,
    pub invocation: HostInvocation,
}

impl HostProfile {
    pub const fn python() -> Self {
        Self {
            name: "python-subprocess",
            invocation: HostInvocation::Stdin { binary: "python3" },
        }
    }

    pub const fn bash() -> Self {
        Self {
            name: "bash-subprocess",
            invocation: HostInvocation::Stdin { binary: "bash" },
        }
    }

    /// TypeScript needs a source file and a runtime resolved from `PATH`:
    /// ts-node, then tsx, then tsx via npx.
    pub const fn typescript() -> Self {
        Self {
            name: "typescript-subprocess",
            invocation: HostInvocation::SourceFile {
                file_name: "index.ts",
                candidates: &[&["ts-node"], &["tsx"], &["npx", "tsx"]],
            },
        }
    }

    pub const fn go() -> Self {
        Self {
            name: "go-subprocess",
            invocation: HostInvocation::SourceFile {
                file_name: "main.go",
                candidates: &[&["go", "run"]],
            },
        }
    }
}

/// Descriptor for running a language inside an ephemeral container.
///
/// `install` and `run` are shell-fragment token sequences; the command
/// builder joins them with spaces into the script handed to `sh -c` inside
/// the container. Dependency names are appended to `install` in caller order.
#[derive(Debug, Clone, Copy)]
pub struct ContainerProfile {
    /// Identifier used in error messages and logs.
    pub name: &'static str,
    /// Container base image reference.
    pub image: &'static str,
    /// Install-command template, absent for languages that take no installs.
    pub install: Option<&'static [&'static str]>,
    /// Run-command template. Code arrives on the container's stdin.
    pub run: &'static [&'static str],
}

impl ContainerProfile {
    pub const fn python() -> Self {
        Self {
            name: "python",
            image: "mcr.microsoft.com/playwright/python:v1.53.0-noble",
            install: Some(&["python", "-m", "pip", "install", "--quiet"]),
            run: &["python"],
        }
    }

    pub const fn bash() -> Self {
        Self {
            name: "bash",
            image: "ubuntu:22.04",
            install: Some(&["apt-get", "update", "-qq", "&&", "apt-get", "install", "-y", "-qq"]),
            run: &["bash"],
        }
    }

    pub const fn typescript() -> Self {
        Self {
            name: "typescript",
            image: "node:22-slim",
            install: Some(&["npm", "install", "-g", "--quiet"]),
            run: &["npx", "--yes", "tsx", "/dev/stdin"],
        }
    }

    pub const fn go() -> Self {
        Self {
            name: "go",
            image: "golang:1.23",
            install: Some(&["go", "get"]),
            run: &["cat", ">", "/tmp/main.go", "&&", "go", "run", "/tmp/main.go"],
        }
    }
}

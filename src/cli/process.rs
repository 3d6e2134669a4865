use std::{
    env,
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Pid, Signal, System};
use tracing::info;

const SERVE_COMMAND: &str = "serve";

pub fn current_executable() -> Result<PathBuf> {
    Ok(env::current_exe()?)
}

/// Finds `serve` processes started from the executable at `name`, skipping this process and its
/// children.
pub fn running_servers(system: &System, name: &Path) -> Result<Vec<Pid>> {
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't get current pid: {e}"))?;
    let mut servers = vec![];
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        let same_executable = process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some();
        let serving = process.cmd().iter().any(|arg| arg == SERVE_COMMAND);

        if same_executable && serving {
            servers.push(*pid);
        }
    }
    Ok(servers)
}

pub fn kill_previous_servers(name: &Path) -> Result<()> {
    let system = System::new_all();
    for pid in running_servers(&system, name)? {
        let Some(process) = system.process(pid) else {
            continue;
        };
        info!("Stopping service {pid}");
        // SIGTERM lets the service persist its settings. Windows has no equivalent, so the
        // process is terminated forcefully there.
        if process.kill_with(Signal::Term).is_none() {
            process.kill();
        }
        let _ = process.wait();
    }
    Ok(())
}

/// Shuts down the previous service and starts a new one. Currently for simplicity sake it operates
/// using a detached process.
pub fn restart_server(dir: &Path) -> Result<()> {
    let process_name = current_executable()?;
    kill_previous_servers(&process_name)?;
    let mut command = std::process::Command::new(process_name);
    command.arg(SERVE_COMMAND).arg("--dir").arg(dir);

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        command.creation_flags(DETACHED_PROCESS);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());

    #[allow(clippy::zombie_processes)]
    let child = command.spawn()?;
    info!("Spawned service {}", child.id());
    Ok(())
}

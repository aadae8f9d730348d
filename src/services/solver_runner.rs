//! Ejecución del solver como subproceso
//!
//! Contrato de invocación:
//! `<solver> <archivo-ubicaciones> <num_vehicles> <depot> <max_distance>`.
//! Se capturan stdout y stderr por separado y se mide el tiempo de pared desde
//! el spawn hasta la salida del proceso. El runner no interpreta la salida.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SolverConfig;

/// Argumentos de una ejecución
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverInvocation {
    pub dataset_path: PathBuf,
    pub num_vehicles: u32,
    pub depot: u32,
    pub max_distance: u32,
}

impl SolverInvocation {
    /// Argumentos posicionales en el orden que espera el solver
    pub fn args(&self) -> Vec<String> {
        vec![
            self.dataset_path.to_string_lossy().into_owned(),
            self.num_vehicles.to_string(),
            self.depot.to_string(),
            self.max_distance.to_string(),
        ]
    }
}

/// Proceso terminado por sí mismo, con cualquier código de salida
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl SolverOutput {
    /// Texto de diagnóstico de un fallo: stderr si tiene contenido, si no stdout
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start solver '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: io::Error,
    },

    #[error("solver timed out after {}s and was terminated", .limit.as_secs_f64())]
    Timeout { limit: Duration, elapsed: Duration },

    #[error("failed while waiting for solver: {source}")]
    Io {
        elapsed: Duration,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Tiempo consumido antes del fallo; también se factura
    pub fn elapsed(&self) -> Duration {
        match self {
            ProcessError::Spawn { .. } => Duration::ZERO,
            ProcessError::Timeout { elapsed, .. } | ProcessError::Io { elapsed, .. } => *elapsed,
        }
    }
}

#[async_trait]
pub trait SolverRunner: Send + Sync {
    async fn run(&self, invocation: &SolverInvocation) -> Result<SolverOutput, ProcessError>;
}

/// Runner real basado en `tokio::process`
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    config: SolverConfig,
}

impl ProcessRunner {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SolverRunner for ProcessRunner {
    async fn run(&self, invocation: &SolverInvocation) -> Result<SolverOutput, ProcessError> {
        let binary = self.config.binary.display().to_string();
        let args = invocation.args();

        let mut command = Command::new(&self.config.binary);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Grupo propio para poder matar también a los hijos del solver
        #[cfg(unix)]
        command.process_group(0);

        debug!("📋 Ejecutando solver: {} {}", binary, args.join(" "));

        let started = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|source| ProcessError::Spawn { binary, source })?;
        let pid = child.id();

        let stdout = SharedBuffer::default();
        let stderr = SharedBuffer::default();
        let mut drain = tokio::spawn(drain_pipes(
            child.stdout.take(),
            child.stderr.take(),
            Arc::clone(&stdout),
            Arc::clone(&stderr),
        ));

        let limit = self.config.timeout;
        match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => {
                let duration = started.elapsed();
                finish_drain(pid, &mut drain)
                    .await
                    .map_err(|source| ProcessError::Io {
                        elapsed: duration,
                        source,
                    })?;

                info!(
                    "✅ Solver terminó con {} en {:.3}s",
                    status,
                    duration.as_secs_f64()
                );
                Ok(SolverOutput {
                    success: status.success(),
                    exit_code: status.code(),
                    stdout: buffer_text(&stdout),
                    stderr: buffer_text(&stderr),
                    duration,
                })
            }
            Ok(Err(source)) => {
                let elapsed = started.elapsed();
                drain.abort();
                terminate(&mut child).await;
                Err(ProcessError::Io { elapsed, source })
            }
            Err(_) => {
                let elapsed = started.elapsed();
                warn!(
                    "⏱️ Solver superó el límite de {}s, terminando el proceso",
                    limit.as_secs_f64()
                );
                drain.abort();
                terminate(&mut child).await;
                Err(ProcessError::Timeout { limit, elapsed })
            }
        }
    }
}

/// Margen para vaciar los pipes una vez que el solver ha salido
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

async fn drain_pipes<O, E>(
    stdout: Option<O>,
    stderr: Option<E>,
    stdout_sink: SharedBuffer,
    stderr_sink: SharedBuffer,
) -> io::Result<()>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let (out, err) = tokio::join!(
        read_pipe(stdout, stdout_sink),
        read_pipe(stderr, stderr_sink)
    );
    out.and(err)
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, sink: SharedBuffer) -> io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    let mut chunk = [0u8; 8192];
    loop {
        let read = pipe.read(&mut chunk).await?;
        if read == 0 {
            return Ok(());
        }
        sink.lock().extend_from_slice(&chunk[..read]);
    }
}

fn buffer_text(buffer: &SharedBuffer) -> String {
    String::from_utf8_lossy(&buffer.lock()).into_owned()
}

/// Esperar al cierre de stdout/stderr tras la salida del solver.
///
/// Un descendiente en segundo plano puede heredar los pipes y mantenerlos
/// abiertos; pasado el margen se mata el grupo y se usa lo ya leído.
async fn finish_drain(
    pid: Option<u32>,
    drain: &mut JoinHandle<io::Result<()>>,
) -> io::Result<()> {
    if let Ok(joined) = tokio::time::timeout(OUTPUT_GRACE, &mut *drain).await {
        return joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    }

    warn!("⚠️ El solver salió pero un descendiente mantiene abierta su salida");
    if let Some(pid) = pid {
        kill_group(pid).await;
    }

    match tokio::time::timeout(OUTPUT_GRACE, &mut *drain).await {
        Ok(joined) => joined.map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
        Err(_) => {
            drain.abort();
            Ok(())
        }
    }
}

/// Matar el grupo de procesos del solver y recoger al hijo directo
async fn terminate(child: &mut Child) {
    if let Some(pid) = child.id() {
        kill_group(pid).await;
    }

    if let Err(e) = child.kill().await {
        warn!("⚠️ Error terminando el solver: {}", e);
    }
}

/// `kill -s KILL -- -<pgid>`; el solver es líder de su propio grupo
#[cfg(unix)]
async fn kill_group(pid: u32) {
    let group = format!("-{}", pid);
    match Command::new("kill")
        .args(["-s", "KILL", "--", group.as_str()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) if status.success() => debug!("🔪 Grupo {} terminado", pid),
        // El grupo ya no existe: no queda nadie a quien matar
        Ok(status) => debug!("📋 kill del grupo {} terminó con {}", pid, status),
        Err(e) => error!(
            "❌ No se pudo ejecutar kill para el grupo {}; sus descendientes pueden seguir vivos: {}",
            pid, e
        ),
    }
}

#[cfg(not(unix))]
async fn kill_group(_pid: u32) {}

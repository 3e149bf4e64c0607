use api::App;
use generator::{gemini::DEFAULT_MODEL, Gemini, Generator};
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use session::Policy;
use std::{
    convert::Infallible,
    env,
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tokio::{net::TcpListener, runtime::Runtime, time};

const SWEEP_PERIOD: Duration = Duration::from_secs(5 * 60);

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse environment variables
    let port = env::var("PORT")?.parse()?;
    let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let require_selection = env::var("QUIZ_REQUIRE_SELECTION")
        .is_ok_and(|flag| flag == "1" || flag.eq_ignore_ascii_case("true"));
    let generator = match env::var("GOOGLE_API_KEY") {
        Ok(key) => Some(Generator::new(Gemini::new(&key, &model)?)),
        Err(_) => {
            log::warn!("GOOGLE_API_KEY is not set; quiz generation is disabled");
            None
        }
    };

    let policy = Policy { require_selection, ..Policy::default() };
    let app = Arc::new(App::new(generator, policy));

    let runtime = Runtime::new()?;
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let tcp = runtime.block_on(TcpListener::bind(addr))?;
    log::info!("Listening to {addr}");

    // Periodically forget idle sessions
    let sweeper = app.clone();
    runtime.spawn(async move {
        let mut ticker = time::interval(SWEEP_PERIOD);
        loop {
            ticker.tick().await;
            sweeper.sweep();
        }
    });

    runtime.block_on(async move {
        let mut stop = core::pin::pin!(tokio::signal::ctrl_c());
        loop {
            let stream = tokio::select! {
                biased;
                result = &mut stop => break result,
                conn = tcp.accept() => match conn {
                    Ok((stream, peer)) => {
                        log::debug!("Accepted connection from {peer}");
                        TokioIo::new(stream)
                    }
                    Err(err) => {
                        log::error!("Failed to accept connection: {err}");
                        continue;
                    }
                },
            };

            let app = app.clone();
            let service = service_fn(move |req| {
                let app = app.clone();
                async move { Ok::<_, Infallible>(app.respond(req).await) }
            });
            drive(http1::Builder::new().serve_connection(stream, service));
        }
    })?;

    log::info!("Shutting down");
    Ok(())
}

fn drive<F>(conn: F)
where
    F: core::future::Future<Output = hyper::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(err) = conn.await {
            log::error!("Connection failed: {err}");
        }
    });
}

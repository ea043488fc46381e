use colored::*;
use std::path::Path;
use std::process::exit;
use tracing::error;

use crate::cli::display::print_images_table;
use crate::cli::{Cli, Commands, ConfigAction, ImagesAction};
use crate::config::DockerConfig;
use crate::docker::{DockerError, DockerManager, ImageBuilder};
use crate::project::validate_project;

/// Dispatch the parsed command line. Handlers print their own failure
/// output and exit non-zero, mirroring one-shot CLI semantics.
pub async fn run(cli: Cli) {
    match cli.command {
        Commands::Check { path } => cmd_check(&path),
        Commands::Build { path, gpu } => cmd_build(&path, gpu).await,
        Commands::Push { image } => cmd_push(image.as_deref()).await,
        Commands::Images { action } => cmd_images(action).await,
        Commands::Config { action } => cmd_config(action),
        Commands::Deploy { path, gpu } => cmd_deploy(&path, gpu).await,
    }
}

/// Print a Docker-layer failure with a hint when the cause is a known
/// connectivity pattern, then exit non-zero.
fn fail(err: &DockerError) -> ! {
    error!("{}", err);
    match err {
        DockerError::DaemonUnreachable(_) => {
            println!("{}", "Cannot connect to the Docker daemon".red());
            println!("Make sure Docker is started and reachable:");
            println!("   - macOS: start Docker Desktop");
            println!("   - Linux: sudo systemctl start docker");
        }
        DockerError::RemoteUnreachable { host, .. } => {
            println!(
                "{} {}",
                "Cannot connect to the remote Docker server:".red(),
                host
            );
            println!("Check your network connection and server configuration:");
            println!("   inoyb config list");
        }
        other => {
            println!("{} {}", "Error:".red(), other);
            if other.is_connectivity() {
                println!("Hint: the Docker endpoint appears to be unreachable");
            }
        }
    }
    exit(1);
}

fn cmd_check(path: &Path) {
    println!("{}", "Checking project structure...".cyan());

    match validate_project(path) {
        Ok((manifest, has_examples)) => {
            println!("{}", "Project structure OK".green());
            println!("   Model name: {}", manifest.model_name().bold());
            if let Some(version) = manifest
                .raw()
                .get("model_info")
                .and_then(|info| info.get("version"))
                .and_then(|v| v.as_str())
            {
                println!("   Model version: {}", version);
            }
            println!("   Includes examples: {}", if has_examples { "yes" } else { "no" });
            println!();
            println!("Project files:");
            println!("   {} gogogo.py", "ok".green());
            println!("   {} mc.json", "ok".green());
            println!("   {} requirements.txt", "ok".green());
            println!("   {} model/", "ok".green());
            if has_examples {
                println!("   {} examples/", "ok".green());
            }
            println!();
            println!("The project is ready. Next steps:");
            println!("   inoyb build     build the image");
            println!("   inoyb deploy    build and push");
        }
        Err(e) => {
            error!("{}", e);
            println!("{} {}", "Project structure check failed:".red(), e);
            println!();
            println!("A project must contain:");
            println!("   - gogogo.py        (service entry point)");
            println!("   - mc.json          (manifest with model_info.name)");
            println!("   - requirements.txt (dependency list)");
            println!("   - model/           (model assets directory)");
            println!("   - examples/        (optional sample data)");
            exit(1);
        }
    }
}

async fn cmd_build(path: &Path, gpu: bool) {
    let variant = if gpu { "GPU" } else { "CPU" };
    println!(
        "{}",
        format!("Building Docker image ({} variant)...", variant).cyan()
    );

    let builder = match ImageBuilder::new().await {
        Ok(builder) => builder,
        Err(e) => fail(&e),
    };

    let (image_name, image_id) = match builder.build_image(path, gpu).await {
        Ok(result) => result,
        Err(e) => fail(&e),
    };

    println!();
    println!("{}", "Image built successfully".green());
    println!("   Name: {}", image_name.bold());
    println!("   ID:   {}", image_id);
    if gpu {
        println!("   GPU support: enabled");
    }

    // Optional retention pass, controlled by config
    match DockerConfig::load() {
        Ok(config) if config.cleanup().auto_cleanup => {
            let removed = builder.cleanup_old_images(config.cleanup().keep_images).await;
            if removed > 0 {
                println!("   Pruned {} old image(s)", removed);
            }
        }
        Ok(_) => {}
        Err(e) => error!("Could not load config for auto-cleanup: {}", e),
    }

    println!();
    println!("Next steps:");
    println!("   inoyb push           push the image");
    println!("   inoyb images list    list built images");
    let deploy = if gpu { "inoyb deploy --gpu" } else { "inoyb deploy" };
    println!("   {}              one-step deploy", deploy);
}

async fn cmd_push(image: Option<&str>) {
    println!("{}", "Pushing image...".cyan());

    let manager = match DockerManager::new().await {
        Ok(manager) => manager,
        Err(e) => fail(&e),
    };

    match image {
        Some(name) => println!("   Image: {}", name),
        None => println!("   Looking for the most recent image..."),
    }

    match manager.push_image(image).await {
        Ok(name) => {
            println!("{}", "Image pushed successfully".green());
            println!("   {} is now on the remote server", name.bold());
        }
        Err(e) => fail(&e),
    }
}

async fn cmd_images(action: ImagesAction) {
    match action {
        ImagesAction::List => {
            let builder = match ImageBuilder::new().await {
                Ok(builder) => builder,
                Err(e) => fail(&e),
            };

            println!("{}", "Local images:".cyan());
            let local = builder.list_local_images(None).await;
            print_images_table(&local);

            println!();
            println!("{}", "Remote images:".cyan());
            match DockerManager::new().await {
                Ok(manager) => match manager.list_remote_images().await {
                    Ok(remote) => print_images_table(&remote),
                    Err(_) => println!("   {}", "(cannot connect to the remote server)".yellow()),
                },
                Err(_) => println!("   {}", "(cannot connect to the remote server)".yellow()),
            }
        }
        ImagesAction::Clean { keep } => {
            let keep_count = match keep {
                Some(n) => n,
                None => match DockerConfig::load() {
                    Ok(config) => config.cleanup().keep_images,
                    Err(e) => fail(&e.into()),
                },
            };

            println!(
                "{}",
                format!("Pruning old images (keeping the newest {})...", keep_count).cyan()
            );

            let builder = match ImageBuilder::new().await {
                Ok(builder) => builder,
                Err(e) => fail(&e),
            };

            let removed = builder.cleanup_old_images(keep_count).await;
            if removed > 0 {
                println!("{}", format!("Removed {} old image(s)", removed).green());
            } else {
                println!("Nothing to prune");
            }
        }
        ImagesAction::Rm { name } => {
            println!("Removing image: {}", name);

            let builder = match ImageBuilder::new().await {
                Ok(builder) => builder,
                Err(e) => fail(&e),
            };

            if builder.remove_image(&name).await {
                println!("{} {}", "Removed".green(), name);
            } else {
                println!("{} {}", "Could not remove".red(), name);
                println!("Check that the image name is correct: inoyb images list");
                exit(1);
            }
        }
    }
}

fn cmd_config(action: ConfigAction) {
    let mut config = match DockerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            println!("{} {}", "Configuration error:".red(), e);
            exit(1);
        }
    };

    match action {
        ConfigAction::Set { key, value } => {
            let result = match key.as_str() {
                "default" => config.use_default_server().map(|()| {
                    println!("{}", "Switched back to the default server".green());
                }),
                "docker.host" => match value {
                    Some(host) => config.set_docker_host(&host).map(|()| {
                        println!("{} {}", "Docker server set to".green(), host);
                    }),
                    None => {
                        println!("{}", "A server address is required".red());
                        println!("Usage: inoyb config set docker.host tcp://my-server:2376");
                        exit(1);
                    }
                },
                other => {
                    println!("{} {}", "Unknown configuration key:".red(), other);
                    println!("Supported keys:");
                    println!("   default              switch back to the default server");
                    println!("   docker.host <addr>   set the Docker server address");
                    exit(1);
                }
            };

            if let Err(e) = result {
                error!("{}", e);
                println!("{} {}", "Configuration error:".red(), e);
                exit(1);
            }
        }
        ConfigAction::List => {
            println!("{}", "Current configuration:".cyan());
            println!("   Docker server: {}", config.docker_host());
            println!(
                "   Using default server: {}",
                if config.is_using_default_server() { "yes" } else { "no" }
            );
            println!("   Registry: {}", config.registry());
            println!("   Templates:");
            println!("     - CPU (default)  GDAL/PROJ/GEOS");
            println!("     - GPU (--gpu)    GDAL/PROJ/GEOS + CUDA");
        }
    }
}

async fn cmd_deploy(path: &Path, gpu: bool) {
    let variant = if gpu { "GPU" } else { "CPU" };
    println!(
        "{}",
        format!("Starting deploy ({} variant)...", variant).cyan()
    );

    let builder = match ImageBuilder::new().await {
        Ok(builder) => builder,
        Err(e) => fail(&e),
    };

    let (image_name, _image_id) = match builder.build_image(path, gpu).await {
        Ok(result) => result,
        Err(e) => fail(&e),
    };
    println!("{} {}", "Image built:".green(), image_name);

    let manager = match DockerManager::new().await {
        Ok(manager) => manager,
        Err(e) => fail(&e),
    };

    match manager.push_image(Some(&image_name)).await {
        Ok(_) => {
            println!("{}", "Image pushed successfully".green());
            println!();
            println!("{} {}", "Deploy complete:".green(), image_name.bold());
        }
        Err(e) => fail(&e),
    }
}

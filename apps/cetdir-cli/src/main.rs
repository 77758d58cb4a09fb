//! cetdir CLI - admin tool for the CET community directory.
//!
//! Lists persona and organization records by verification bucket and runs
//! the verification transitions against the local record store.

use anyhow::{Context, Result};
use cetdir_core::{
    AdminContext, AdminRuntime, Bucket, CetdirConfig, EntityKind, NewRecord, RecordId,
    Transition,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

/// cetdir - CET community directory administration
///
/// Verifies personas and organizations, sends invitations and manages
/// uploaded files.
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Directory holding `.cetdir/` (defaults to the current directory)
    #[arg(short = 'C', long = "config", value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Admin account performing the action
    #[arg(long, global = true)]
    admin: Option<String>,

    /// Admin name shown in invitation messages
    #[arg(long, global = true)]
    admin_name: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available cetdir commands
#[derive(Subcommand)]
enum Commands {
    /// List records of an entity grouped by verification bucket
    List {
        /// `persona` or `organizacion`
        entity: EntityKind,

        /// Include record ids and emails
        #[arg(short, long)]
        long: bool,
    },

    /// Print a record as JSON
    Show { id: String },

    /// Create a record
    ///
    /// Without `--submission` the record is an admin placeholder waiting for
    /// contact information.
    Create {
        /// `persona` or `organizacion`
        entity: EntityKind,

        /// Display name
        name: String,

        /// Contact email
        #[arg(long)]
        email: Option<String>,

        /// Create a self-service submission pending approval
        #[arg(long)]
        submission: bool,
    },

    /// Approve a category change request and assign the category
    ApproveCategory { id: String, category: String },

    /// Approve a pending organization
    ApproveOrg { id: String },

    /// Reject a record
    Reject { id: String },

    /// Add the contact email of a placeholder and invite it
    Invite { id: String, email: String },

    /// Send an invitation to the record's email
    Send { id: String },

    /// Send a new invitation, superseding the previous one
    Resend { id: String },

    /// Claim a record with an invitation token
    Claim {
        id: String,

        /// Account linked to the record
        #[arg(long)]
        account: String,

        /// Invitation token
        #[arg(long)]
        token: String,
    },

    /// Soft-delete a record
    Delete { id: String },

    /// Restore a soft-deleted record
    Restore { id: String },

    /// Upload a file to a storage bucket
    Upload {
        /// File to upload
        file: PathBuf,

        /// Target bucket
        #[arg(long)]
        bucket: String,

        /// Folder inside the bucket
        #[arg(long, default_value = "")]
        folder: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = run_command(cli).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing subscriber for structured logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = if verbose {
        EnvFilter::new("cetdir=debug,cetdir_core=debug,cetdir_mail=debug")
    } else {
        EnvFilter::new("cetdir=info,cetdir_core=info,cetdir_mail=info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute the specified command
async fn run_command(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let config = CetdirConfig::load(root).context("Failed to load cetdir configuration")?;
    let runtime = AdminRuntime::new(config).context("Failed to create admin runtime")?;
    let admin = Admin {
        uid: cli.admin,
        name: cli.admin_name,
    };

    match cli.command {
        Commands::List { entity, long } => run_list(&runtime, entity, long).await,
        Commands::Show { id } => {
            let record = runtime.get(&RecordId::new(id)).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Create {
            entity,
            name,
            email,
            submission,
        } => {
            let new = if submission {
                NewRecord::submission(entity, name, email)
            } else {
                let mut placeholder = NewRecord::admin_placeholder(entity, name);
                placeholder.email = email;
                placeholder
            };
            let record = runtime.create(new).await.context("Failed to create record")?;
            println!("✔ Created {} {} ({})", record.entity, record.id, record.state);
            Ok(())
        }
        Commands::ApproveCategory { id, category } => {
            info!("Approving category change: {}", id);
            let result = runtime
                .approve_category_change(&RecordId::new(id), &category, &admin.context()?)
                .await
                .context("Failed to approve category change")?;
            report(&result);
            Ok(())
        }
        Commands::ApproveOrg { id } => {
            info!("Approving organization: {}", id);
            let result = runtime
                .approve_organization(&RecordId::new(id), &admin.context()?)
                .await
                .context("Failed to approve organization")?;
            report(&result);
            Ok(())
        }
        Commands::Reject { id } => {
            info!("Rejecting: {}", id);
            let result = runtime
                .reject(&RecordId::new(id), &admin.context()?)
                .await
                .context("Failed to reject record")?;
            report(&result);
            Ok(())
        }
        Commands::Invite { id, email } => {
            info!("Inviting {} at {}", id, email);
            let result = runtime
                .add_contact_and_invite(&RecordId::new(id), &email, &admin.context()?)
                .await
                .context("Failed to invite")?;
            report(&result);
            Ok(())
        }
        Commands::Send { id } => {
            let result = runtime
                .send_invitation(&RecordId::new(id), &admin.context()?)
                .await
                .context("Failed to send invitation")?;
            report(&result);
            Ok(())
        }
        Commands::Resend { id } => {
            let result = runtime
                .resend_invitation(&RecordId::new(id), &admin.context()?)
                .await
                .context("Failed to resend invitation")?;
            report(&result);
            Ok(())
        }
        Commands::Claim { id, account, token } => {
            let result = runtime
                .claim(&RecordId::new(id), &account, &token, chrono::Utc::now())
                .await
                .context("Failed to claim record")?;
            report(&result);
            Ok(())
        }
        Commands::Delete { id } => {
            let record = runtime
                .soft_delete(&RecordId::new(id), &admin.context()?)
                .await
                .context("Failed to delete record")?;
            println!("✔ Deleted {}", record.id);
            Ok(())
        }
        Commands::Restore { id } => {
            let record = runtime
                .restore(&RecordId::new(id))
                .await
                .context("Failed to restore record")?;
            println!("✔ Restored {}", record.id);
            Ok(())
        }
        Commands::Upload {
            file,
            bucket,
            folder,
        } => run_upload(&runtime, &file, &bucket, &folder).await,
    }
}

/// Admin identity taken from the global flags.
struct Admin {
    uid: Option<String>,
    name: Option<String>,
}

impl Admin {
    fn context(&self) -> Result<AdminContext> {
        let uid = self
            .uid
            .clone()
            .context("This command requires --admin <uid>")?;
        let mut context = AdminContext::now(uid);
        if let Some(name) = &self.name {
            context = context.with_display_name(name.clone());
        }
        Ok(context)
    }
}

/// Run the list command
async fn run_list(runtime: &AdminRuntime, entity: EntityKind, long: bool) -> Result<()> {
    let buckets = runtime
        .list_buckets(entity)
        .await
        .context("Failed to list records")?;

    for bucket in Bucket::ALL {
        let records = buckets.get(bucket);
        println!("{} ({})", bucket.label(), records.len());
        for record in records {
            if long {
                println!(
                    "  {}  {}  {}",
                    record.id,
                    record.display_name,
                    record.email.as_deref().unwrap_or("-")
                );
            } else {
                println!("  {}", record.display_name);
            }
        }
    }

    if buckets.unbucketed > 0 {
        println!("\n{} record(s) with inconsistent state", buckets.unbucketed);
    }
    if buckets.deleted > 0 {
        println!("{} deleted record(s) hidden", buckets.deleted);
    }

    Ok(())
}

/// Run the upload command
async fn run_upload(
    runtime: &AdminRuntime,
    file: &std::path::Path,
    bucket: &str,
    folder: &str,
) -> Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .context("Upload path has no file name")?;

    let on_progress = |pct: u8| tracing::debug!(progress = pct, "uploading");
    let url = runtime
        .upload(&bytes, &file_name, bucket, folder, Some(&on_progress))
        .await
        .context("Failed to upload file")?;

    println!("{}", url);
    Ok(())
}

fn report((record, outcome): &Transition) {
    println!("✔ {}: {} → {}", record.id, outcome.from, outcome.to);
    if let Some(invitation) = &outcome.invitation {
        println!("  invitation token: {}", invitation.token);
        println!("  expires at: {}", invitation.expires_at.to_rfc3339());
    }
}

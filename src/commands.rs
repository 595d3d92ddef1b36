//! Subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use serde::Serialize;

use cms_client::auth;
use cms_client::seed::run_seed;
use cms_client::{
    ClientConfig, FileTokenStore, HttpTransport, ListQuery, ListResponse, Media, Patient,
    PatientInput, PatientSearch, PatientService, SeedPlan, Treatment, TreatmentDetailInput,
    TreatmentInput, TreatmentService, TreatmentTarget, UploadService,
};
use cms_types::EntryId;

use crate::{
    Commands, PatientCommands, PatientFields, PatientListArgs, SeedArgs, TreatmentCommands,
    TreatmentFields,
};

struct Context {
    store: Arc<FileTokenStore>,
    transport: Arc<HttpTransport>,
    page_size: u32,
    json: bool,
}

pub(crate) async fn run(command: Commands, config: &ClientConfig, json: bool) -> anyhow::Result<()> {
    let store = Arc::new(FileTokenStore::new(config.token_file()));
    let transport = Arc::new(HttpTransport::new(config, store.clone())?);
    let ctx = Context {
        store,
        transport,
        page_size: config.page_size(),
        json,
    };

    match command {
        Commands::Login {
            identifier,
            password,
        } => {
            let session =
                auth::login(ctx.transport.as_ref(), ctx.store.as_ref(), &identifier, &password)
                    .await?;
            println!(
                "Logged in as {}",
                session.username().unwrap_or(identifier.as_str())
            );
        }
        Commands::Logout => {
            auth::logout(ctx.store.as_ref())?;
            println!("Logged out");
        }
        Commands::Whoami => {
            let session = auth::require_session(ctx.store.as_ref())?;
            println!("{}", session.username().unwrap_or("(unknown user)"));
        }
        Commands::Patients(command) => patients(&ctx, command).await?,
        Commands::Treatments(command) => treatments(&ctx, command).await?,
        Commands::Upload { path, name } => {
            let media = upload(&ctx, &path, name).await?;
            print_media(&ctx, &media)?;
        }
        Commands::DeleteFile { id } => {
            delete_file(&ctx, id).await?;
            println!("Deleted file {id}");
        }
        Commands::Seed(args) => seed(&ctx, args).await?,
        Commands::Targets => {
            for target in TreatmentTarget::ALL {
                println!("{:<20} {}", target.as_str(), target.label());
            }
        }
    }

    Ok(())
}

async fn patients(ctx: &Context, command: PatientCommands) -> anyhow::Result<()> {
    auth::require_session(ctx.store.as_ref())?;
    let service = PatientService::new(ctx.transport.clone());

    match command {
        PatientCommands::List(args) => {
            let search = patient_search(args, ctx.page_size);
            let page = service.search(&search).await?;
            print_patients(ctx, &page)?;
        }
        PatientCommands::Create(fields) => {
            let patient = service.create(&patient_input(fields)).await?;
            println!("Created patient {} ({})", patient.name, patient.document_id);
        }
        PatientCommands::Update {
            document_id,
            fields,
        } => {
            let patient = service.update(&document_id, &patient_input(fields)).await?;
            println!("Updated patient {} ({})", patient.name, patient.document_id);
        }
        PatientCommands::Delete { document_id } => {
            service.delete(&document_id).await?;
            println!("Deleted patient {document_id}");
        }
    }
    Ok(())
}

async fn treatments(ctx: &Context, command: TreatmentCommands) -> anyhow::Result<()> {
    auth::require_session(ctx.store.as_ref())?;
    let service = TreatmentService::new(ctx.transport.clone());

    match command {
        TreatmentCommands::List {
            page,
            page_size,
            patient,
        } => {
            let query = ListQuery::new().paginate(
                page.unwrap_or(cms_query::DEFAULT_PAGE),
                page_size.unwrap_or(ctx.page_size),
            )?;
            let page = match patient {
                Some(patient) => service.list_for_patient(&patient, query).await?,
                None => service.list(&query).await?,
            };
            print_treatments(ctx, &page)?;
        }
        TreatmentCommands::Create(fields) => {
            let treatment = service.create(&treatment_input(fields)).await?;
            println!("Created treatment {}", treatment.document_id);
        }
        TreatmentCommands::Update {
            document_id,
            fields,
        } => {
            let treatment = service
                .update(&document_id, &treatment_input(fields))
                .await?;
            println!("Updated treatment {}", treatment.document_id);
        }
        TreatmentCommands::Delete { document_id } => {
            service.delete(&document_id).await?;
            println!("Deleted treatment {document_id}");
        }
    }
    Ok(())
}

async fn upload(ctx: &Context, path: &Path, name: Option<String>) -> anyhow::Result<Media> {
    auth::require_session(ctx.store.as_ref())?;
    let service = UploadService::new(ctx.transport.clone());
    service
        .upload_path(path, name)
        .await
        .with_context(|| format!("uploading {}", path.display()))
}

async fn delete_file(ctx: &Context, id: EntryId) -> anyhow::Result<()> {
    auth::require_session(ctx.store.as_ref())?;
    UploadService::new(ctx.transport.clone())
        .delete_file(id)
        .await?;
    Ok(())
}

async fn seed(ctx: &Context, args: SeedArgs) -> anyhow::Result<()> {
    auth::require_session(ctx.store.as_ref())?;
    let plan = SeedPlan {
        patients: args.patients,
        records_per_patient: args.records_per_patient,
        lesions_per_record: args.lesions_per_record,
        photos_per_lesion: args.photos_per_lesion,
        image_bytes: args.image_kib * 1024,
        max_workers: args.max_workers,
    };

    let started = std::time::Instant::now();
    let report = run_seed(ctx.transport.clone(), ctx.transport.clone(), &plan).await?;
    println!(
        "Seeded {} patients, {} records, {} photos ({} failures) in {:.2}s",
        report.patients_created,
        report.records_created,
        report.photos_uploaded,
        report.failures,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

fn patient_search(args: PatientListArgs, default_page_size: u32) -> PatientSearch {
    PatientSearch {
        page: args.page.unwrap_or(cms_query::DEFAULT_PAGE),
        page_size: args.page_size.unwrap_or(default_page_size),
        keyword: args.keyword,
        name: args.name,
        gender: args.gender,
        birthday_range: args.born_from.zip(args.born_to),
        past_treatments: args.past_treatments,
    }
}

fn patient_input(fields: PatientFields) -> PatientInput {
    let mut input = PatientInput::new(fields.name, fields.gender);
    input.birthday = fields.birthday;
    input.past_treatments = fields.past_treatments;
    input
}

fn treatment_input(fields: TreatmentFields) -> TreatmentInput {
    let mut input = TreatmentInput::new(fields.patient);
    input.treatment_no = fields.treatment_no;
    input.target = fields.target;
    input.sequence_number = fields.sequence_number;
    input.duration = fields.duration;
    input.images = fields.images;
    input.details = fields.lesions;
    input
}

/// Parses `SITE=ID[,ID...]` into a lesion. The site may be a stored value or a label.
pub(crate) fn parse_lesion(raw: &str) -> Result<TreatmentDetailInput, String> {
    let (site, ids) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected SITE=ID[,ID...], got '{raw}'"))?;
    let part: TreatmentTarget = site.parse().map_err(|e| format!("{e}"))?;
    let photos = ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<EntryId>()
                .map_err(|_| format!("'{s}' is not a media id"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if photos.is_empty() {
        return Err(format!("lesion '{site}' lists no photos"));
    }
    Ok(TreatmentDetailInput {
        part,
        notes: None,
        duration: None,
        photos,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_page_footer<T>(page: &ListResponse<T>) {
    let info = &page.pagination;
    println!(
        "page {}/{} ({} per page), {} total",
        info.page,
        info.page_count.max(1),
        info.page_size,
        info.total
    );
}

fn print_patients(ctx: &Context, page: &ListResponse<Patient>) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&page.items);
    }
    if page.is_empty() {
        println!("No patients found.");
        return Ok(());
    }
    for patient in &page.items {
        let latest = patient
            .latest_treatment()
            .and_then(|t| t.treatment_no.as_deref())
            .unwrap_or("-");
        println!(
            "{:<26} {:<12} {:<7} {:<11} latest: {}",
            patient.document_id.as_str(),
            patient.name,
            patient.gender.map(|g| g.as_str()).unwrap_or("-"),
            patient
                .birthday
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into()),
            latest
        );
    }
    print_page_footer(page);
    Ok(())
}

fn print_treatments(ctx: &Context, page: &ListResponse<Treatment>) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(&page.items);
    }
    if page.is_empty() {
        println!("No treatments found.");
        return Ok(());
    }
    for treatment in &page.items {
        println!(
            "{:<26} {:<14} {:<10} {:<8} {} photos",
            treatment.document_id.as_str(),
            treatment.treatment_no.as_deref().unwrap_or("-"),
            treatment.target.map(|t| t.label()).unwrap_or("-"),
            treatment
                .patient
                .as_ref()
                .map(|p| p.name.as_str())
                .unwrap_or("-"),
            treatment.all_photos().count()
        );
    }
    print_page_footer(page);
    Ok(())
}

fn print_media(ctx: &Context, media: &Media) -> anyhow::Result<()> {
    if ctx.json {
        return print_json(media);
    }
    println!("Uploaded {} as media {} ({})", media.name, media.id, media.url);
    Ok(())
}

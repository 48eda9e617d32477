use crate::infra::{
    demo_arts_student, demo_institution_id, demo_science_student, seed_demo_catalog,
    InMemoryAdmissionStore, StaticTokenVerifier,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use std::sync::Arc;
use uniform::admissions::{
    ApplicationQuery, ApplicationRegister, ApprovalDetails, AuthenticatedCaller, ReviewWorkflow,
    SubmitRequest, UnitId,
};
use uniform::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluate deadlines as of this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
    /// Skip the institution-admin review portion of the demo.
    #[arg(long)]
    pub(crate) skip_review: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { as_of, skip_review } = args;

    let now: DateTime<Utc> = match as_of.and_then(|date| date.and_hms_opt(9, 0, 0)) {
        Some(naive) => DateTime::from_naive_utc_and_offset(naive, Utc),
        None => Utc::now(),
    };

    let store = InMemoryAdmissionStore::default();
    let verifier = StaticTokenVerifier::default();
    seed_demo_catalog(&store, &verifier);

    let store = Arc::new(store);
    let register = ApplicationRegister::new(store.clone());
    let review = ReviewWorkflow::new(store);

    let science = demo_science_student();
    let arts = demo_arts_student();
    let science_caller = AuthenticatedCaller::student(science.id.0.clone());
    let arts_caller = AuthenticatedCaller::student(arts.id.0.clone());
    let admin = AuthenticatedCaller::institution_admin("admin-du", demo_institution_id());

    println!("Admission workflow demo (evaluated {})", now.date_naive());

    println!("\nUnit catalog for {} at University of Dhaka", science.name);
    match register.eligible_units(&science_caller, &demo_institution_id()) {
        Ok(listings) => {
            for listing in listings {
                let marker = if listing.eligible { "eligible" } else { "not eligible" };
                let deadline = listing
                    .application_deadline
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "open-ended".to_string());
                println!("- {} ({marker}, deadline {deadline})", listing.name);
            }
        }
        Err(err) => {
            println!("  Catalog unavailable: {err}");
            return Ok(());
        }
    }

    let request = SubmitRequest {
        unit_id: UnitId("unit-du-ka".to_string()),
        center_preference: Some("Dhaka".to_string()),
    };
    let application = match register.submit_at(&science_caller, request.clone(), now) {
        Ok(application) => {
            println!(
                "\nSubmitted application {} -> status {}",
                application.id.0,
                application.review_state().label()
            );
            application
        }
        Err(err) => {
            println!("\nSubmission rejected: {err}");
            return Ok(());
        }
    };

    match register.submit_at(&science_caller, request, now) {
        Ok(_) => println!("Duplicate submission unexpectedly accepted"),
        Err(err) => println!("Duplicate submission rejected: {err}"),
    }

    match register.submit_at(
        &arts_caller,
        SubmitRequest {
            unit_id: UnitId("unit-du-ka".to_string()),
            center_preference: None,
        },
        now,
    ) {
        Ok(_) => println!("Arts-track submission unexpectedly accepted"),
        Err(err) => println!("Arts-track submission to Ka Unit rejected: {err}"),
    }

    println!("\nInstitution-admin dashboard");
    match register.list(&admin, &ApplicationQuery::default()) {
        Ok(groups) => {
            for group in groups {
                println!("- {} ({} applications)", group.unit_name, group.total);
                for summary in group.applications {
                    println!(
                        "    {} | {} <{}> | {} path | {}",
                        summary.id.0,
                        summary.student_name,
                        summary.student_email,
                        summary.exam_path.label(),
                        summary.status
                    );
                }
            }
        }
        Err(err) => println!("  Dashboard unavailable: {err}"),
    }

    if skip_review {
        return Ok(());
    }

    println!("\nReview workflow");
    let details = ApprovalDetails {
        seat_no: Some("KA-1042".to_string()),
        exam_date: NaiveDate::from_ymd_opt(2026, 3, 6),
        exam_time: Some("10:00".to_string()),
        exam_center: Some("Curzon Hall".to_string()),
    };
    match review.approve_at(&admin, &application.id, details, now) {
        Ok(approved) => println!(
            "Approved {} with seat {}",
            approved.id.0,
            approved.seat_no.as_deref().unwrap_or("-")
        ),
        Err(err) => println!("Approval failed: {err}"),
    }
    match review.approve_at(&admin, &application.id, ApprovalDetails::default(), now) {
        Ok(_) => println!("Second approval unexpectedly accepted"),
        Err(err) => println!("Second approval rejected: {err}"),
    }

    match register.detail(&admin, &application.id) {
        Ok(detail) => match serde_json::to_string_pretty(&detail) {
            Ok(json) => println!("\nApplication detail payload:\n{json}"),
            Err(err) => println!("\nApplication detail unavailable: {err}"),
        },
        Err(err) => println!("\nApplication detail unavailable: {err}"),
    }

    Ok(())
}

//! End-to-end CSV import against an in-memory database.

mod common;

use circl_core::config::ImportConfig;
use circl_core::import::{ImportStep, ImportWizard};
use circl_core::model::Circle;
use common::{test_client, test_storage};

const EXPORT: &str = "\u{feff}Full Name,E-mail,Mobile,Company,Title,Birthday,Circle,Tags,LinkedIn\n\
\"Jane Doe\",\"jane@x.com\",\"\",Acme,CTO,04/12/1990,inner,\"work; climbing\",linkedin.com/in/jane\n\
Omar Haddad,\"omar@acme.com (work); omar@gmail.com\",555-0100,,,,middle,,\n\
Bad Row,not-an-email,,,,,,,\n\
,,,,,,,,\n\
Lee Park,,,,,,besties,,\n";

#[tokio::test]
async fn import_maps_validates_and_inserts() {
    let storage = test_storage();
    let client = test_client(&storage);
    let mut wizard = ImportWizard::new(&ImportConfig::default());

    wizard.load_csv(EXPORT).unwrap();
    assert_eq!(wizard.step(), ImportStep::Map);
    let mapping = wizard.mapping().unwrap();
    assert_eq!(mapping.column_for("name"), Some("Full Name"));
    assert_eq!(mapping.column_for("personal_email"), Some("E-mail"));
    assert_eq!(mapping.column_for("linkedin_url"), Some("LinkedIn"));

    let report = wizard.confirm().unwrap();
    assert_eq!(report.valid_contacts.len(), 3);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert_eq!(report.skipped_empty, 1);

    let outcome = wizard.submit(&client).await.unwrap();
    assert_eq!(outcome.imported, 3);
    assert_eq!(outcome.failed, 1);

    let contacts = client.fetch_contacts().await.unwrap();
    assert_eq!(contacts.len(), 3);

    let jane = contacts.iter().find(|c| c.name() == "Jane Doe").unwrap();
    assert_eq!(jane.circle(), Circle::Inner);
    assert_eq!(jane.fields.personal_email.as_deref(), Some("jane@x.com"));
    assert_eq!(jane.fields.mobile_phone, None);
    assert_eq!(jane.fields.birthday.unwrap().to_string(), "1990-04-12");
    assert_eq!(
        jane.fields.linkedin_url.as_deref(),
        Some("https://linkedin.com/in/jane")
    );
    assert!(jane.fields.tags.contains("climbing"));

    let omar = contacts.iter().find(|c| c.name() == "Omar Haddad").unwrap();
    assert_eq!(omar.fields.work_email.as_deref(), Some("omar@acme.com"));
    assert_eq!(omar.fields.personal_email.as_deref(), Some("omar@gmail.com"));

    let lee = contacts.iter().find(|c| c.name() == "Lee Park").unwrap();
    assert_eq!(lee.circle(), Circle::Outer);
}

#[tokio::test]
async fn imports_are_scoped_to_the_importing_user() {
    let storage = test_storage();
    let alice = test_client(&storage);
    let bob = test_client(&storage);

    let mut wizard = ImportWizard::new(&ImportConfig::default());
    wizard.load_csv("Name\nJane Doe\n").unwrap();
    wizard.confirm().unwrap();
    wizard.submit(&alice).await.unwrap();

    assert_eq!(alice.fetch_contacts().await.unwrap().len(), 1);
    assert!(bob.fetch_contacts().await.unwrap().is_empty());
}

#[tokio::test]
async fn manual_remap_before_confirm() {
    let storage = test_storage();
    let client = test_client(&storage);
    let mut wizard = ImportWizard::new(&ImportConfig::default());

    wizard.load_csv("Who,Where\nAnn,Porto\n").unwrap();
    wizard.set_mapping("Name", "Who").unwrap();
    wizard.set_mapping("Location", "Where").unwrap();
    wizard.confirm().unwrap();
    wizard.submit(&client).await.unwrap();

    let contacts = client.fetch_contacts().await.unwrap();
    assert_eq!(contacts[0].name(), "Ann");
    assert_eq!(contacts[0].fields.location.as_deref(), Some("Porto"));
}

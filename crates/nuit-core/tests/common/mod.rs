pub mod fixture_site;
